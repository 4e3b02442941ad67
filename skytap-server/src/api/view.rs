use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use skytap_core::{get_keyboard_layouts, sorted_keyboard_layouts, UserState};

use crate::{host::HostContext, ApiContextRef};

/// Everything the launch controls need to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentViewData {
    pub display_name: String,
    /// `(code, display name)` pairs ordered by display name
    pub keyboard_layouts: Vec<(String, String)>,
    pub preferred_keyboard_layout: String,
}

pub async fn student_view(
    State(context): State<ApiContextRef>,
    host: HostContext,
) -> Json<StudentViewData> {
    let layouts = get_keyboard_layouts(context.launcher.settings());
    let user_state = context.preferences.for_learner(host.learner_id());

    Json(StudentViewData {
        display_name: context.config.display_name.clone(),
        keyboard_layouts: sorted_keyboard_layouts(layouts),
        preferred_keyboard_layout: user_state.preferred_keyboard_layout(),
    })
}
