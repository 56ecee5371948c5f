pub mod catalog;
pub mod line_items;
pub mod order_state;
