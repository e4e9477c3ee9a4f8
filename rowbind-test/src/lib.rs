pub mod fixtures;
mod mock;

pub use fixtures::{Membership, User};
pub use mock::{table_schema, MockDatabase, MockError};
