//! Widgets.

pub mod choice_list;
pub mod multi_select;
pub mod paragraph;
pub mod progress_task;
pub mod text_input;
pub mod vertical_layout;

pub use choice_list::{Choice, ChoiceList};
pub use multi_select::MultiSelect;
pub use paragraph::Paragraph;
pub use progress_task::{ProgressHandle, ProgressTask, Ticker};
pub use text_input::TextInput;
pub use vertical_layout::VerticalLayout;
