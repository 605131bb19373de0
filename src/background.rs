/// Chrome-backed store, notifier, and listener registration
///
/// Compiled only for the wasm32 extension bundle. The content script
/// sends messages via chrome.runtime.sendMessage; the listener returns
/// `true` to keep the sendResponse channel open and replies once the
/// router's future resolves.
use crate::clock::SystemClock;
use crate::messages::InstallReason;
use crate::notify::{Notification, Notifier};
use crate::router::Router;
use crate::store::{PreferenceStore, StoreError};
use js_sys::{Function, Promise, Reflect};
use serde::Serialize;
use serde_json::{Map, Value};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::console;

type BackgroundRouter = Router<LocalStore, ChromeNotifier, SystemClock>;

pub fn start() {
    let router = Rc::new(Router::new(LocalStore, ChromeNotifier, SystemClock));
    register_message_listener(router.clone());
    register_install_listener(router);
}

/// `PreferenceStore` over the promise-based chrome.storage.local API
pub struct LocalStore;

impl PreferenceStore for LocalStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        let keys_js = to_js(&keys)?;
        let values = call_storage("get", &keys_js).await?;
        serde_wasm_bindgen::from_value(values).map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<(), StoreError> {
        let entries_js = to_js(&entries)?;
        call_storage("set", &entries_js).await?;
        Ok(())
    }
}

fn storage_area() -> Result<JsValue, StoreError> {
    let chrome = Reflect::get(&js_sys::global(), &"chrome".into()).map_err(js_error)?;
    let storage = Reflect::get(&chrome, &"storage".into()).map_err(js_error)?;
    let local = Reflect::get(&storage, &"local".into()).map_err(js_error)?;
    if local.is_undefined() {
        return Err(StoreError::Backend("chrome.storage.local unavailable".to_string()));
    }
    Ok(local)
}

async fn call_storage(method: &str, arg: &JsValue) -> Result<JsValue, StoreError> {
    let area = storage_area()?;
    let func: Function = Reflect::get(&area, &method.into())
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| StoreError::Backend(format!("storage.{} is not a function", method)))?;
    let promise: Promise = func
        .call1(&area, arg)
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| StoreError::Backend(format!("storage.{} did not return a promise", method)))?;
    JsFuture::from(promise).await.map_err(js_error)
}

/// Serialize to a plain JS object (chrome APIs reject ES Maps)
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, StoreError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| StoreError::Backend(e.to_string()))
}

fn js_error(value: JsValue) -> StoreError {
    StoreError::Backend(format!("{:?}", value))
}

/// chrome.notifications.create, fire-and-forget
pub struct ChromeNotifier;

impl Notifier for ChromeNotifier {
    fn notify(&self, notification: Notification) {
        let options = match to_js(&notification.to_options()) {
            Ok(options) => options,
            Err(e) => {
                console::error_1(&format!("notification options: {}", e).into());
                return;
            }
        };

        let chrome = Reflect::get(&js_sys::global(), &"chrome".into()).unwrap_or(JsValue::UNDEFINED);
        let create = Reflect::get(&chrome, &"notifications".into())
            .and_then(|notifications| Reflect::get(&notifications, &"create".into()))
            .ok()
            .and_then(|create| create.dyn_into::<Function>().ok());

        match create {
            Some(create) => {
                // No acknowledgement: the returned promise is dropped
                if let Err(e) = create.call1(&JsValue::UNDEFINED, &options) {
                    console::error_1(&e);
                }
            }
            None => console::warn_1(&"chrome.notifications unavailable".into()),
        }
    }
}

fn register_message_listener(router: Rc<BackgroundRouter>) {
    // chrome.runtime.onMessage callback: (message, sender, sendResponse).
    // Returning true tells the runtime to keep sendResponse open for
    // async use.
    let callback = Closure::wrap(Box::new(
        move |message: JsValue, _sender: JsValue, send_response: Function| -> JsValue {
            let message: Value = match serde_wasm_bindgen::from_value(message) {
                Ok(message) => message,
                Err(e) => {
                    console::error_1(&format!("unreadable message: {}", e).into());
                    return JsValue::FALSE;
                }
            };

            let router = router.clone();
            spawn_local(async move {
                let response = router.dispatch(message).await;
                match to_js(&response) {
                    Ok(reply) => {
                        if let Err(e) = send_response.call1(&JsValue::UNDEFINED, &reply) {
                            console::error_1(&e);
                        }
                    }
                    Err(e) => console::error_1(&format!("response encoding: {}", e).into()),
                }
            });

            JsValue::TRUE
        },
    )
        as Box<dyn FnMut(JsValue, JsValue, Function) -> JsValue>);

    add_runtime_listener("onMessage", callback.as_ref());

    // Lives for the lifetime of the background service worker
    callback.forget();
}

fn register_install_listener(router: Rc<BackgroundRouter>) {
    let callback = Closure::wrap(Box::new(move |details: JsValue| {
        let tag = Reflect::get(&details, &"reason".into())
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default();
        let reason = InstallReason::from_tag(&tag);

        let router = router.clone();
        spawn_local(async move {
            if let Err(e) = router.handle_install(reason).await {
                console::error_1(&format!("install handler: {}", e).into());
            }
        });
    }) as Box<dyn FnMut(JsValue)>);

    add_runtime_listener("onInstalled", callback.as_ref());
    callback.forget();
}

fn add_runtime_listener(event_name: &str, callback: &JsValue) {
    let event = Reflect::get(&js_sys::global(), &"chrome".into())
        .ok()
        .filter(|chrome| !chrome.is_undefined())
        .and_then(|chrome| Reflect::get(&chrome, &"runtime".into()).ok())
        .and_then(|runtime| Reflect::get(&runtime, &event_name.into()).ok())
        .filter(|event| !event.is_undefined());

    let Some(event) = event else {
        console::warn_1(&format!("chrome.runtime.{} unavailable", event_name).into());
        return;
    };

    match Reflect::get(&event, &"addListener".into())
        .ok()
        .and_then(|add| add.dyn_into::<Function>().ok())
    {
        Some(add_listener) => {
            if let Err(e) = add_listener.call1(&event, callback) {
                console::error_1(&e);
            }
        }
        None => console::warn_1(&format!("chrome.runtime.{}.addListener unavailable", event_name).into()),
    }
}
