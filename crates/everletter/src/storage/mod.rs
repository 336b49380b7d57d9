pub mod avatar;

pub use avatar::{object_name_from_url, AvatarStore};
