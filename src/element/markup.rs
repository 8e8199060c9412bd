//! Shared card markup for element fragments.
//!
//! Binding contract with the scaffold script:
//! - the live value node carries `id="<name>"`;
//! - an actuator control carries `data-element="<name>"`.

/// Render a display card.  `control` is appended inside the card body,
/// after the value node (empty for read-only elements).
pub fn card(header: &str, caption: &str, name: &str, control: &str) -> String {
    format!(
        r#"<div class="container mt-5">
    <div class="row justify-content-center">
        <div class="col-md-6">
            <div class="card text-center">
                <div class="card-header">{header}</div>
                <div class="card-body">
                    <h5 class="card-title">{caption}</h5>
                    <h2 id="{name}"></h2>
                </div>
                {control}
            </div>
        </div>
    </div>
</div>
"#
    )
}

/// Checkbox toggle bound to an actuated element.
pub fn toggle_control(name: &str, label: &str) -> String {
    format!(
        r#"<input type="checkbox" class="btn-check" id="{name}-toggle" data-element="{name}" autocomplete="off">
                <label class="btn btn-outline-success" for="{name}-toggle">{label}</label>"#
    )
}

/// Value-node binding token for `name`.
pub fn value_binding(name: &str) -> String {
    format!(r#"id="{name}""#)
}

/// Control binding token for `name`.
pub fn control_binding(name: &str) -> String {
    format!(r#"data-element="{name}""#)
}
