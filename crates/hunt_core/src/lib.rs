pub mod domain;
pub mod memory;
pub mod ports;
pub mod progression;

pub use domain::{Answer, NewAnswer, NewPost, NewQuestion, Post, Question, SessionClaims};
pub use memory::InMemoryHuntRepository;
pub use ports::{HuntRepository, PortError, PortResult, SessionTokenService};
pub use progression::{matches_variant, normalize_answer, Advance, Progression, Stage};
