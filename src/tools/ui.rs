//! Mouse, keyboard, and screen operations.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::session::Session;

/// Android key codes accepted by [`Ui::send_key`].
pub mod key_code {
    /// Home button.
    pub const HOME: i32 = 3;
    /// Back button.
    pub const BACK: i32 = 4;
    /// Volume up.
    pub const VOLUME_UP: i32 = 24;
    /// Volume down.
    pub const VOLUME_DOWN: i32 = 25;
    /// Power button.
    pub const POWER: i32 = 26;
    /// Menu button.
    pub const MENU: i32 = 82;
}

const VALID_BUTTONS: &[&str] = &["left", "right", "middle", "double_left"];
const DEFAULT_ELEMENT_TIMEOUT_MS: u64 = 2000;

/// One node of the UI element tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UiElement {
    /// Screen bounds, `left,top,right,bottom`.
    #[serde(default)]
    pub bounds: String,
    /// Widget class name.
    #[serde(default)]
    pub class_name: String,
    /// Visible text.
    #[serde(default)]
    pub text: String,
    /// Element type token.
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Resource identifier.
    #[serde(default)]
    pub resource_id: String,
    /// Child index within the parent.
    #[serde(default)]
    pub index: Option<i32>,
    /// Nested elements.
    #[serde(default)]
    pub children: Vec<UiElement>,
}

/// Result of an interaction with no payload.
#[derive(Debug, Clone, Default)]
pub struct UiResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the interaction succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
}

/// Result of a screenshot.
#[derive(Debug, Clone, Default)]
pub struct ScreenshotResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the capture succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// Where the capture landed (sandbox path or URL).
    pub data: String,
}

/// Result of a UI element query.
#[derive(Debug, Clone, Default)]
pub struct UiElementsResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the query succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// Element rows (or trees, for the full query).
    pub elements: Vec<UiElement>,
}

/// Mouse/keyboard/screen wrapper.
#[derive(Debug, Clone, Copy)]
pub struct Ui<'a> {
    session: &'a Session,
}

impl<'a> Ui<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Capture the screen.
    pub async fn screenshot(&self) -> ScreenshotResult {
        let result = self.session.call_tool("system_screenshot", json!({})).await;
        ScreenshotResult {
            request_id: result.request_id,
            success: result.success,
            error_message: result.error_message,
            data: result.data,
        }
    }

    /// Click at `(x, y)` with `button` (default `left`).
    ///
    /// Unknown buttons fail locally without a network round trip.
    pub async fn click(&self, x: i32, y: i32, button: Option<&str>) -> UiResult {
        let button = button.unwrap_or("left");
        if !VALID_BUTTONS.contains(&button) {
            return UiResult {
                request_id: String::new(),
                success: false,
                error_message: format!(
                    "invalid button '{button}'; expected one of: {}",
                    VALID_BUTTONS.join(", ")
                ),
            };
        }
        let args = json!({ "x": x, "y": y, "button": button });
        self.plain("click", args).await
    }

    /// Send a hardware key event; see [`key_code`].
    pub async fn send_key(&self, key: i32) -> UiResult {
        self.plain("send_key", json!({ "key": key })).await
    }

    /// Type text into the focused element.
    pub async fn input_text(&self, text: &str) -> UiResult {
        self.plain("input_text", json!({ "text": text })).await
    }

    /// Swipe from `(start_x, start_y)` to `(end_x, end_y)`.
    pub async fn swipe(
        &self,
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        duration_ms: u64,
    ) -> UiResult {
        let args = json!({
            "start_x": start_x,
            "start_y": start_y,
            "end_x": end_x,
            "end_y": end_y,
            "duration_ms": duration_ms,
        });
        self.plain("swipe", args).await
    }

    /// Fetch the clickable elements currently on screen.
    pub async fn get_clickable_ui_elements(&self, timeout_ms: Option<u64>) -> UiElementsResult {
        self.elements("get_clickable_ui_elements", timeout_ms).await
    }

    /// Fetch the full element tree currently on screen.
    pub async fn get_all_ui_elements(&self, timeout_ms: Option<u64>) -> UiElementsResult {
        self.elements("get_all_ui_elements", timeout_ms).await
    }

    async fn plain(&self, tool: &str, args: serde_json::Value) -> UiResult {
        let result = self.session.call_tool(tool, args).await;
        UiResult {
            request_id: result.request_id,
            success: result.success,
            error_message: result.error_message,
        }
    }

    async fn elements(&self, tool: &str, timeout_ms: Option<u64>) -> UiElementsResult {
        let args = json!({
            "timeout_ms": timeout_ms.unwrap_or(DEFAULT_ELEMENT_TIMEOUT_MS),
        });
        let result = self.session.call_tool(tool, args).await;
        if !result.success {
            return UiElementsResult {
                request_id: result.request_id,
                success: false,
                error_message: result.error_message,
                elements: Vec::new(),
            };
        }
        match serde_json::from_str::<Vec<UiElement>>(&result.data) {
            Ok(elements) => UiElementsResult {
                request_id: result.request_id,
                success: true,
                error_message: String::new(),
                elements,
            },
            Err(err) => UiElementsResult {
                request_id: result.request_id,
                success: false,
                error_message: format!("element payload was not parseable: {err}"),
                elements: Vec::new(),
            },
        }
    }
}
