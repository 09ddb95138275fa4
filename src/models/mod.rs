pub mod entity;
pub mod form;
pub mod log_row;
pub mod submission;

pub use entity::{ResolvedEntity, RoomSlot, ROOM_INDICES, UNKNOWN_HOTEL};
pub use form::{FormSchema, MatrixLabel, MatrixRoomLocator, QuestionMeta, MATRIX_TYPE};
pub use log_row::{LogRow, Status};
pub use submission::{Answer, AnswerValue, Submission};
