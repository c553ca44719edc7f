use std::sync::Arc;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Ledge".to_string(),
            width: 640,
            height: 480,
            resizable: false,
        }
    }
}

/// Create the game window. The projection is fixed at startup, so the window
/// is not resizable by default to keep the world-to-pixel ratio stable.
pub fn create_window(event_loop: &ActiveEventLoop, config: &PlatformConfig) -> Arc<Window> {
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_resizable(config.resizable)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

    let window = event_loop
        .create_window(attrs)
        .expect("Failed to create window");
    log::debug!(
        "Created window '{}' ({}x{}, resizable: {})",
        config.title,
        config.width,
        config.height,
        config.resizable
    );
    Arc::new(window)
}
