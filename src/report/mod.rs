pub mod html;
pub mod reporter;

pub use html::{escape_html, render_html};
pub use reporter::{spawn_reporter, RecordBlock, Reporter, INITIAL_STATUS};
