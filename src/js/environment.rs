use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context as AnyhowContext, Result};
use rquickjs::{BigInt, Ctx, FromJs, Function, IntoJs, Value};
use tracing::{debug, error};

use crate::config::ShimConfig;
use crate::error::ShimError;
use crate::host::{CallGate, GateBridge, Handle, HostBridge};
use crate::registry::{ListenerId, ListenerRegistry};

use super::runtime::QuickJsEngine;

/// Script-side listener reference: the key of a function kept in the
/// runtime's listener table.
type ListenerSlot = u32;

/// A QuickJS context exposing `console`, `document`, `Node`, `Event` and
/// `XMLHttpRequest` to scripts, with every effect routed through a
/// [`HostBridge`].
///
/// Listener registrations live in a registry owned by the environment and
/// are dropped with it.
pub struct ScriptEnvironment {
    engine: QuickJsEngine,
    listeners: Rc<RefCell<ListenerRegistry<ListenerSlot>>>,
    bridge: Rc<dyn HostBridge>,
}

impl ScriptEnvironment {
    pub fn new(bridge: Rc<dyn HostBridge>) -> Result<Self> {
        Self::with_config(bridge, &ShimConfig::default())
    }

    pub fn from_gate<G: CallGate + 'static>(gate: G) -> Result<Self> {
        Self::new(Rc::new(GateBridge::new(gate)))
    }

    pub fn with_config(bridge: Rc<dyn HostBridge>, config: &ShimConfig) -> Result<Self> {
        let engine = QuickJsEngine::with_config(config)?;
        let listeners = Rc::new(RefCell::new(ListenerRegistry::new()));
        install_host_bindings(&engine, Rc::clone(&bridge), Rc::clone(&listeners))?;
        engine
            .eval(SHIM_RUNTIME, &config.runtime_filename)
            .context("failed to evaluate shim runtime")?;
        Ok(Self {
            engine,
            listeners,
            bridge,
        })
    }

    pub fn eval(&self, source: &str, filename: &str) -> Result<()> {
        self.engine.eval(source, filename)
    }

    pub fn eval_with<V>(&self, source: &str, filename: &str) -> Result<V>
    where
        V: for<'js> rquickjs::FromJs<'js>,
    {
        self.engine.eval_with(source, filename)
    }

    /// Host-originated event: dispatch a new `Event(event_type)` on a fresh
    /// `Node(handle)` and report whether the default action should proceed.
    pub fn dispatch_event(&self, handle: &Handle, event_type: &str) -> Result<bool> {
        let handle = handle.clone();
        let event_type = event_type.to_string();
        debug!(target: "scriptshim", handle = %handle, event_type = %event_type, "host dispatch");
        let proceed = self
            .engine
            .with_context(|ctx| {
                let dispatch: Function = ctx.globals().get("__scriptshim_dispatch")?;
                dispatch.call::<_, bool>((handle, event_type))
            })
            .context("event dispatch failed")?;
        self.engine.drain_jobs()?;
        Ok(proceed)
    }

    pub fn is_listening(&self, event_type: &str) -> bool {
        self.listeners.borrow().is_listening(event_type)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn bridge(&self) -> Rc<dyn HostBridge> {
        Rc::clone(&self.bridge)
    }
}

impl Drop for ScriptEnvironment {
    fn drop(&mut self) {
        let released = self.listeners.borrow_mut().clear();
        debug!(target: "scriptshim", dropped = released.len(), "script environment closed");
    }
}

/// Largest integer a JS number holds exactly.
const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Indices a JS number cannot hold exactly cross as `BigInt`, so the host
/// gets back the handle it handed out.
impl<'js> IntoJs<'js> for Handle {
    fn into_js(self, ctx: &Ctx<'js>) -> rquickjs::Result<Value<'js>> {
        match self {
            Handle::Index(index) if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&index) => {
                (index as f64).into_js(ctx)
            }
            Handle::Index(index) => Ok(BigInt::from_i64(ctx.clone(), index)?.into_value()),
            Handle::Token(token) => token.into_js(ctx),
        }
    }
}

impl<'js> FromJs<'js> for Handle {
    fn from_js(_ctx: &Ctx<'js>, value: Value<'js>) -> rquickjs::Result<Self> {
        if let Some(index) = value.as_int() {
            return Ok(Handle::Index(i64::from(index)));
        }
        if let Some(big) = value.as_big_int() {
            return Ok(Handle::Index(big.clone().to_i64()?));
        }
        if let Some(number) = value.as_float() {
            if number.fract() == 0.0 {
                return Ok(Handle::Index(number as i64));
            }
        }
        if let Some(token) = value.as_string() {
            return Ok(Handle::Token(token.to_string()?));
        }
        Err(rquickjs::Error::new_from_js("value", "node handle"))
    }
}

fn host_error<T>(ctx: &Ctx<'_>, err: ShimError) -> rquickjs::Result<T> {
    error!(target: "quickjs", "host call failed: {err}");
    let value = err.to_string().into_js(ctx)?;
    Err(ctx.throw(value))
}

fn install_host_bindings(
    engine: &QuickJsEngine,
    bridge: Rc<dyn HostBridge>,
    listeners: Rc<RefCell<ListenerRegistry<ListenerSlot>>>,
) -> Result<()> {
    engine.with_context(|ctx| {
        let global = ctx.globals();

        // Host operations
        {
            let bridge = Rc::clone(&bridge);
            let func = Function::new(
                ctx.clone(),
                move |ctx: Ctx<'_>, message: String| -> rquickjs::Result<()> {
                    bridge.log(&message).or_else(|err| host_error(&ctx, err))
                },
            )?
            .with_name("__scriptshim_log")?;
            global.set("__scriptshim_log", func)?;
        }

        {
            let bridge = Rc::clone(&bridge);
            let func = Function::new(
                ctx.clone(),
                move |ctx: Ctx<'_>, selector: String| -> rquickjs::Result<Vec<Handle>> {
                    bridge
                        .query_selector_all(&selector)
                        .or_else(|err| host_error(&ctx, err))
                },
            )?
            .with_name("__scriptshim_query")?;
            global.set("__scriptshim_query", func)?;
        }

        {
            let bridge = Rc::clone(&bridge);
            let func = Function::new(
                ctx.clone(),
                move |ctx: Ctx<'_>,
                      handle: Handle,
                      name: String|
                      -> rquickjs::Result<Option<String>> {
                    bridge
                        .get_attribute(&handle, &name)
                        .or_else(|err| host_error(&ctx, err))
                },
            )?
            .with_name("__scriptshim_get_attribute")?;
            global.set("__scriptshim_get_attribute", func)?;
        }

        {
            let bridge = Rc::clone(&bridge);
            let func = Function::new(
                ctx.clone(),
                move |ctx: Ctx<'_>, handle: Handle, html: String| -> rquickjs::Result<()> {
                    bridge
                        .set_inner_html(&handle, &html)
                        .or_else(|err| host_error(&ctx, err))
                },
            )?
            .with_name("__scriptshim_set_inner_html")?;
            global.set("__scriptshim_set_inner_html", func)?;
        }

        {
            let bridge = Rc::clone(&bridge);
            let func = Function::new(
                ctx.clone(),
                move |ctx: Ctx<'_>,
                      method: String,
                      url: String,
                      body: Option<String>|
                      -> rquickjs::Result<String> {
                    bridge
                        .xhr_send(&method, &url, body.as_deref())
                        .or_else(|err| host_error(&ctx, err))
                },
            )?
            .with_name("__scriptshim_xhr_send")?;
            global.set("__scriptshim_xhr_send", func)?;
        }

        // Listener registry
        {
            let listeners = Rc::clone(&listeners);
            let func = Function::new(
                ctx.clone(),
                move |handle: Handle,
                      event_type: String,
                      slot: ListenerSlot|
                      -> rquickjs::Result<f64> {
                    let id = listeners.borrow_mut().add(&handle, &event_type, slot);
                    debug!(
                        target: "scriptshim",
                        handle = %handle,
                        event_type = %event_type,
                        listener = id.get(),
                        "listener registered"
                    );
                    Ok(id.get() as f64)
                },
            )?
            .with_name("__scriptshim_add_listener")?;
            global.set("__scriptshim_add_listener", func)?;
        }

        {
            let listeners = Rc::clone(&listeners);
            let func = Function::new(
                ctx.clone(),
                move |handle: Handle, event_type: String, id: f64| -> rquickjs::Result<bool> {
                    let id = ListenerId::from_raw(id as u64);
                    Ok(listeners.borrow_mut().remove(&handle, &event_type, id))
                },
            )?
            .with_name("__scriptshim_remove_listener")?;
            global.set("__scriptshim_remove_listener", func)?;
        }

        {
            let listeners = Rc::clone(&listeners);
            let func = Function::new(
                ctx.clone(),
                move |handle: Handle,
                      event_type: String|
                      -> rquickjs::Result<Vec<ListenerSlot>> {
                    Ok(listeners.borrow().snapshot(&handle, &event_type))
                },
            )?
            .with_name("__scriptshim_listeners")?;
            global.set("__scriptshim_listeners", func)?;
        }

        Ok(())
    })
}

const SHIM_RUNTIME: &str = r#"
(() => {
    const global = globalThis;
    const native = {
        log: global.__scriptshim_log,
        query: global.__scriptshim_query,
        getAttribute: global.__scriptshim_get_attribute,
        setInnerHtml: global.__scriptshim_set_inner_html,
        xhrSend: global.__scriptshim_xhr_send,
        addListener: global.__scriptshim_add_listener,
        removeListener: global.__scriptshim_remove_listener,
        listeners: global.__scriptshim_listeners,
    };
    for (const name of Object.keys(global)) {
        if (name.startsWith('__scriptshim_')) {
            delete global[name];
        }
    }

    // Host failures arrive as thrown strings.
    const hostCall = (fn, ...args) => {
        try {
            return fn(...args);
        } catch (err) {
            throw err instanceof Error ? err : new Error(String(err));
        }
    };

    global.console = {
        log: (...args) => hostCall(native.log, args.map((arg) => String(arg)).join(' ')),
    };

    function Node(handle) {
        this.handle = handle;
    }

    Node.prototype.getAttribute = function (name) {
        return hostCall(native.getAttribute, this.handle, String(name));
    };

    Object.defineProperty(Node.prototype, 'innerHTML', {
        set: function (value) {
            hostCall(native.setInnerHtml, this.handle, String(value));
        },
        configurable: true,
    });

    Node.prototype.setInnerHTML = function (value) {
        this.innerHTML = value;
    };

    // slot -> { listener, id }
    const listenerTable = new Map();
    let nextSlot = 1;

    Node.prototype.addEventListener = function (type, listener) {
        if (typeof listener !== 'function') {
            throw new TypeError('listener must be a function');
        }
        const slot = nextSlot++;
        const id = native.addListener(this.handle, String(type), slot);
        listenerTable.set(slot, { listener, id });
    };

    Node.prototype.removeEventListener = function (type, listener) {
        const slots = native.listeners(this.handle, String(type));
        for (const slot of slots) {
            const entry = listenerTable.get(slot);
            if (entry && entry.listener === listener) {
                native.removeListener(this.handle, String(type), entry.id);
                listenerTable.delete(slot);
                return;
            }
        }
    };

    Node.prototype.dispatchEvent = function (evt) {
        const listeners = native
            .listeners(this.handle, String(evt.type))
            .map((slot) => listenerTable.get(slot))
            .filter((entry) => entry !== undefined)
            .map((entry) => entry.listener);
        for (let i = 0; i < listeners.length; i++) {
            listeners[i].call(this, evt);
        }
        return !cancelled.has(evt);
    };

    Node.prototype.addListener = Node.prototype.addEventListener;
    Node.prototype.removeListener = Node.prototype.removeEventListener;
    Node.prototype.dispatch = Node.prototype.dispatchEvent;

    // Events whose default was prevented. Membership is one-way.
    const cancelled = new WeakSet();

    function Event(type) {
        Object.defineProperty(this, 'type', { value: String(type), enumerable: true });
    }

    Object.defineProperty(Event.prototype, 'defaultPrevented', {
        get: function () {
            return cancelled.has(this);
        },
        configurable: false,
    });

    Event.prototype.preventDefault = function () {
        cancelled.add(this);
    };

    Event.prototype.cancel = Event.prototype.preventDefault;

    function XMLHttpRequest() {
        this.responseText = null;
    }

    XMLHttpRequest.prototype.open = function (method, url, isAsync) {
        if (isAsync) {
            throw new Error('Asynchronous XHR is not supported');
        }
        this.method = String(method);
        this.url = String(url);
    };

    XMLHttpRequest.prototype.send = function (body) {
        if (this.method === undefined) {
            throw new Error('XMLHttpRequest.send before open is not supported');
        }
        const payload = body === undefined || body === null ? null : String(body);
        this.responseText = hostCall(native.xhrSend, this.method, this.url, payload);
    };

    const querySelectorAll = (selector) =>
        hostCall(native.query, String(selector)).map((handle) => new Node(handle));

    global.document = {
        querySelectorAll,
        query: querySelectorAll,
    };
    global.Node = Node;
    global.Event = Event;
    global.XMLHttpRequest = XMLHttpRequest;

    Object.defineProperty(global, '__scriptshim_dispatch', {
        value: (handle, type) => new Node(handle).dispatchEvent(new Event(type)),
    });
})();
"#;
