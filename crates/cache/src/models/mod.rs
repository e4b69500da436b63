mod video;

pub(crate) use self::video::{SummaryRow, VideoRow};
pub use self::video::RecordSummary;
