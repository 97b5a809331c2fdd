pub mod chat;
pub mod compass;
pub mod forge;
pub mod user;

pub use compass::{Career, CompassEntry, SkillProgress, SkillState};
pub use user::{Compass, UserData, UserProfile};
