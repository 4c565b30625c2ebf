pub mod db;
pub mod jwt;

pub use db::PgHuntRepository;
pub use jwt::JwtSessionTokens;
