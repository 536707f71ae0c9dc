pub mod canvas;
pub mod cards;
pub mod gui;
pub mod logging;
pub mod settings;
