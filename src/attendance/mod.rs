pub mod recorder;

pub use recorder::{AttendanceRecorder, NewAttendance};
