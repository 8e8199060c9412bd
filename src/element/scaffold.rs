//! Page scaffold — document head, stylesheet and the client binding script.
//!
//! Presentation-only: contributes no telemetry and accepts no commands.
//! Registered first so its markup opens the page; every other element's
//! fragment follows in registry order.
//!
//! The script keeps one WebSocket to `/ws`:
//! - each inbound snapshot key updates the node with the same `id`, and
//!   re-syncs any toggle bound to that key;
//! - clicking a toggle records `toSend[name] = checked` and sends the
//!   accumulated object;
//! - a closed socket is reopened after 2 s.

use super::{Capability, Element};
use crate::error::ElementError;

/// Wire and binding name of the scaffold.
pub const SCAFFOLD_NAME: &str = "HTML";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en" data-bs-theme="dark">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>__TITLE__</title>
    <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css" rel="stylesheet" integrity="sha384-T3c6CoIi6uLrA9TneNEoa7RxnatzjcDSCmG1MXxSR1GAsXEV/Dwwykc2MPK8M2HN" crossorigin="anonymous">
</head>
<body>
<script src="https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/js/bootstrap.bundle.min.js" integrity="sha384-C6RzsynM9kWDrMNeT87bh95OGNyZPhcTNXj1NW7RuBCsyN/o0jlpcV8Qyq46cDfL" crossorigin="anonymous"></script>
<script>
    var websocket, toSend = {};
    window.addEventListener("load", onLoad);

    function sendData() {
        if (websocket && websocket.readyState === WebSocket.OPEN) {
            websocket.send(JSON.stringify(toSend));
        }
    }

    function onToggle(event) {
        toSend[event.target.dataset.element] = event.target.checked;
        sendData();
    }

    function onClose(event) { setTimeout(onLoad, 2000); }

    function onLoad() {
        document.querySelectorAll("[data-element]").forEach(function (el) {
            el.onclick = onToggle;
        });
        websocket = new WebSocket(`ws://${window.location.host}/ws`);
        websocket.onclose = onClose;
        websocket.onmessage = onMessage;
    }

    function onMessage(event) {
        let json = JSON.parse(event.data);
        for (let name in json) {
            let node = document.getElementById(name);
            if (node) node.innerText = json[name];
            let toggle = document.querySelector(`[data-element="${name}"]`);
            if (toggle) toggle.checked = json[name] >= 100;
        }
    }
</script>
"#;

pub struct PageScaffold {
    title: String,
}

impl PageScaffold {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_owned(),
        }
    }
}

impl Element for PageScaffold {
    fn name(&self) -> &str {
        SCAFFOLD_NAME
    }

    fn capability(&self) -> Capability {
        Capability::PresentationOnly
    }

    fn read_value(&mut self) -> Result<f32, ElementError> {
        Err(ElementError::unsupported_read())
    }

    fn write_value(&mut self, _on: bool) -> Result<(), ElementError> {
        Err(ElementError::unsupported_write())
    }

    fn render(&self) -> String {
        // The scaffold's binding token is the document marker itself.
        TEMPLATE.replace("__TITLE__", &self.title).replace(
            "<html lang=\"en\"",
            &format!("<html id=\"{SCAFFOLD_NAME}\" lang=\"en\""),
        )
    }
}
