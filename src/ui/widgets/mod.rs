pub mod chat_panel;
pub mod member_list;
pub mod visualizer;

pub use chat_panel::ChatPanel;
pub use member_list::MemberList;
pub use visualizer::{shape, Shape, VisualizerWidget};
