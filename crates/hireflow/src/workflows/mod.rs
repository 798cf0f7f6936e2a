pub mod applications;
pub mod error;
pub mod jobs;
pub mod session;
pub mod validation;

pub use error::WorkflowError;
pub use session::{
    AuthToken, Credentials, Registration, Session, SessionContext, User, UserId, UserRole,
};
pub use validation::{FieldError, ValidationErrors};
