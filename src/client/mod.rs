mod components;
mod handlers;
mod screens;

pub use components::{DashboardUI, FocusedWidget, Flow, FormField, FormInput, LoginField, LoginInput};
