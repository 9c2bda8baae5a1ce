//! DOM controls of both demos.
//!
//! Every control posts a [`Command`] through the event loop proxy; nothing
//! here touches the session directly. Elements that are missing from the page
//! are skipped with a warning, so the same bundle serves the configurator and
//! the showroom markup.

use wasm_bindgen::{JsCast, prelude::*};
use web_sys::{Document, Element, HtmlInputElement, HtmlOptionElement, HtmlSelectElement};
use winit::event_loop::EventLoopProxy;

use crate::{
    camera::ViewPreset,
    command::Command,
    flow::FlowEvent,
    garage::CarChoice,
    launch::AppVariant,
    material::Color,
    parts::PartCategory,
    session::Session,
    stage::Environment,
};

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn by_id<T: JsCast>(id: &str) -> Option<T> {
    let element = document()?.get_element_by_id(id);
    match element {
        Some(element) => element.dyn_into::<T>().ok(),
        None => {
            log::warn!("No #{} on this page", id);
            None
        }
    }
}

fn by_class(class: &str) -> Vec<Element> {
    let Some(nodes) = document().and_then(|d| d.query_selector_all(&format!(".{}", class)).ok())
    else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|idx| nodes.get(idx))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

/// Posts the command built by `command` whenever `event` fires on `target`.
fn listen(
    target: &web_sys::EventTarget,
    event: &str,
    proxy: &EventLoopProxy<FlowEvent>,
    command: impl Fn() -> Option<Command> + 'static,
) {
    let proxy = proxy.clone();
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
        if let Some(command) = command() {
            if proxy.send_event(FlowEvent::Command(command)).is_err() {
                log::warn!("Event loop is gone, dropping input");
            }
        }
    });
    if target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .is_err()
    {
        log::warn!("Cannot listen to {}", event);
    }
    closure.forget();
}

fn on_input(id: &str, proxy: &EventLoopProxy<FlowEvent>, command: fn(&HtmlInputElement) -> Option<Command>) {
    if let Some(input) = by_id::<HtmlInputElement>(id) {
        let target = input.clone();
        listen(&target, "input", proxy, move || command(&input));
    }
}

fn on_change(id: &str, proxy: &EventLoopProxy<FlowEvent>, command: fn(&str) -> Option<Command>) {
    if let Some(select) = by_id::<HtmlSelectElement>(id) {
        let target = select.clone();
        listen(&target, "change", proxy, move || command(&select.value()));
    }
}

fn on_click(id: &str, proxy: &EventLoopProxy<FlowEvent>, command: Command) {
    if let Some(button) = by_id::<Element>(id) {
        listen(&button, "click", proxy, move || Some(command.clone()));
    }
}

fn slider(input: &HtmlInputElement) -> Option<f32> {
    input.value().parse().ok()
}

fn fill_select<'a>(id: &str, options: impl IntoIterator<Item = (String, &'a str)>, selected: &str) {
    let (Some(select), Some(document)) = (by_id::<HtmlSelectElement>(id), document()) else {
        return;
    };
    select.set_length(0);
    for (value, label) in options {
        let Ok(option) = document
            .create_element("option")
            .and_then(|e| e.dyn_into::<HtmlOptionElement>().map_err(JsValue::from))
        else {
            continue;
        };
        option.set_value(&value);
        option.set_text(label);
        option.set_selected(value == selected);
        if select.append_child(&option).is_err() {
            log::warn!("Cannot add '{}' to #{}", label, id);
        }
    }
}

/// Fills the static dropdowns and wires every control to the event loop.
pub fn bind_controls(proxy: EventLoopProxy<FlowEvent>, session: &Session) {
    let proxy = &proxy;
    let selection = session.selection();
    let catalog = session.catalog();
    let names = |presets: &[crate::catalog::MaterialPreset]| {
        presets
            .iter()
            .enumerate()
            .map(|(idx, preset)| (idx.to_string(), preset.name.clone()))
            .collect::<Vec<_>>()
    };
    for (id, presets, selected) in [
        ("body-mat", names(catalog.main()), selection.body),
        ("rim-mat", names(catalog.main()), selection.rim),
        ("glass-mat", names(catalog.glass()), selection.glass),
    ] {
        fill_select(
            id,
            presets.iter().map(|(value, name)| (value.clone(), name.as_str())),
            &selected.to_string(),
        );
    }

    on_change("body-mat", proxy, |v| v.parse().ok().map(Command::SelectBodyMaterial));
    on_change("rim-mat", proxy, |v| v.parse().ok().map(Command::SelectRimMaterial));
    on_change("glass-mat", proxy, |v| v.parse().ok().map(Command::SelectGlassMaterial));
    on_change("part-select", proxy, |v| PartCategory::from_label(v).map(Command::SelectPart));
    on_change("environmentSelect", proxy, |v| {
        Some(Command::SelectEnvironment(Environment::from_key(v)))
    });

    match session.profile().variant {
        AppVariant::Configurator => on_input("color-picker", proxy, |input| {
            Color::parse(&input.value()).map(Command::PickColor)
        }),
        AppVariant::Showroom => on_input("color-picker", proxy, |input| {
            Color::parse(&input.value()).map(Command::PaintBody)
        }),
    }
    on_input("camera-toggle", proxy, |input| Some(Command::SetFollowCamera(input.checked())));
    on_input("autoRotate", proxy, |input| Some(Command::SetAutoRotate(input.checked())));
    on_input("shadowsToggle", proxy, |input| Some(Command::SetShadows(input.checked())));
    on_input("metallicSlider", proxy, |input| slider(input).map(Command::SetMetalness));
    on_input("roughnessSlider", proxy, |input| slider(input).map(Command::SetRoughness));
    on_input("zoomSlider", proxy, |input| slider(input).map(Command::Zoom));
    on_input("lightingSlider", proxy, |input| slider(input).map(Command::SetLighting));

    on_click("screenshotBtn", proxy, Command::Screenshot);
    on_click("shareBtn", proxy, Command::Share);
    on_click("fullscreenBtn", proxy, Command::ToggleFullscreen);

    for button in by_class("view-btn") {
        let view = button.get_attribute("data-view");
        match view.as_deref().and_then(ViewPreset::from_key) {
            Some(view) => listen(&button, "click", proxy, move || {
                Some(Command::SetCameraView(view))
            }),
            None => log::warn!("view-btn with unknown data-view {:?}", view),
        }
    }
    for thumb in by_class("car-thumb") {
        let car = thumb.get_attribute("data-car");
        match car.as_deref().and_then(CarChoice::from_key) {
            Some(car) => listen(&thumb, "click", proxy, move || Some(Command::SelectCar(car))),
            None => log::warn!("car-thumb with unknown data-car {:?}", car),
        }
    }
    for swatch in by_class("color-option") {
        let color = swatch.get_attribute("data-color");
        match color.as_deref().and_then(Color::parse) {
            Some(color) => listen(&swatch, "click", proxy, move || {
                Some(Command::PaintBody(color))
            }),
            None => log::warn!("color-option with unknown data-color {:?}", color),
        }
    }

    refresh(session);
}

/// Brings the page in line with a newly loaded car.
pub fn refresh(session: &Session) {
    let selection = session.selection();
    let parts = session.available_parts();
    if !parts.is_empty() {
        fill_select(
            "part-select",
            parts.iter().map(|part| (part.label().to_string(), part.label())),
            selection.part.label(),
        );
    }

    if session.profile().variant == AppVariant::Showroom {
        let info = selection.car.info();
        for (id, text) in [
            ("carName", info.name),
            ("carPower", info.power),
            ("carAcceleration", info.acceleration),
            ("carTopSpeed", info.top_speed),
            ("carPrice", info.price),
        ] {
            if let Some(element) = by_id::<Element>(id) {
                element.set_text_content(Some(text));
            }
        }
        for thumb in by_class("car-thumb") {
            let active = thumb.get_attribute("data-car").as_deref() == Some(selection.car.key());
            if thumb.class_list().toggle_with_force("active", active).is_err() {
                log::warn!("Cannot mark the active car");
            }
        }
    }
}

/// Saves a data URL through a temporary download link.
pub fn download(file_name: &str, data_url: &str) {
    let Some(link) = document()
        .and_then(|d| d.create_element("a").ok())
        .and_then(|e| e.dyn_into::<web_sys::HtmlAnchorElement>().ok())
    else {
        log::error!("Cannot create a download link");
        return;
    };
    link.set_download(file_name);
    link.set_href(data_url);
    link.click();
}

/// Writes the share URL of `encoded` into `#share-url` and the address bar.
pub fn show_share_url(encoded: &str) {
    let Some(location) = web_sys::window().map(|w| w.location()) else {
        return;
    };
    let (Ok(origin), Ok(path)) = (location.origin(), location.pathname()) else {
        log::warn!("Cannot read the page location");
        return;
    };
    let url = crate::share::share_url(&origin, &path, encoded);
    match by_id::<Element>("share-url") {
        Some(output) => match output.dyn_ref::<HtmlInputElement>() {
            Some(input) => input.set_value(&url),
            None => output.set_text_content(Some(&url)),
        },
        None => log::info!("Share URL: {}", url),
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let search = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default();
    let params = web_sys::UrlSearchParams::new_with_str(&search)?;
    // Each page names its demo in <body data-app="...">; the URL can override it.
    let page_app = document()
        .and_then(|d| d.body())
        .and_then(|body| body.get_attribute("data-app"))
        .map(|app| ("app", app));
    let pairs = page_app.into_iter().chain(
        ["app", "model", "config"]
            .into_iter()
            .filter_map(|key| params.get(key).map(|value| (key, value))),
    );
    let options = crate::launch::LaunchOptions::from_pairs(pairs);
    crate::flow::run(options).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
