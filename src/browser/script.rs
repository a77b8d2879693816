use super::session::{PageId, Scope};
use crate::locator::rule::js_string;
use crate::locator::SelectionRule;
use std::time::Duration;

pub const REF_ATTRIBUTE: &str = "data-g2b-ref";

/// Finds a tagged element in the document or any same-origin frame below it.
const FIND_FN: &str = r#"
const __g2bFind = (doc, token) => {
    const el = doc.querySelector('[data-g2b-ref="' + token + '"]');
    if (el) return el;
    for (const frame of doc.querySelectorAll('iframe, frame')) {
        try {
            const inner = frame.contentDocument;
            if (inner) {
                const found = __g2bFind(inner, token);
                if (found) return found;
            }
        } catch (_) {}
    }
    return null;
};
"#;

fn scope_expr(scope: &Scope) -> String {
    match scope {
        Scope::Document => "document".to_string(),
        Scope::Within(handle) => format!("__g2bFind(document, {})", js_string(&handle.token)),
        Scope::Frame(handle) => format!(
            "(() => {{ const f = __g2bFind(document, {}); try {{ return f && f.contentDocument; }} catch (_) {{ return null; }} }})()",
            js_string(&handle.token)
        ),
    }
}

pub fn query(page: PageId, scope: &Scope, rule: &SelectionRule) -> String {
    let filter = rule
        .text_filter()
        .map(|text| text.to_js_predicate())
        .unwrap_or_else(|| "null".to_string());

    format!(
        r#"(() => {{
    {find}
    const root = {scope};
    if (!root) return [];
    const filter = {filter};
    const out = [];
    for (const el of Array.from(root.querySelectorAll({css}))) {{
        if (filter) {{
            const raw = el.innerText || el.value || el.textContent || '';
            if (!filter(String(raw).replace(/\s+/g, ' ').trim())) continue;
        }}
        let ref = el.getAttribute('{attr}');
        if (!ref) {{
            ref = 'g' + Math.random().toString(36).slice(2, 10) + Date.now().toString(36);
            el.setAttribute('{attr}', ref);
        }}
        const view = el.ownerDocument.defaultView || window;
        const style = view.getComputedStyle(el);
        const rect = el.getBoundingClientRect();
        const visible = style.display !== 'none' && style.visibility !== 'hidden'
            && rect.width > 0 && rect.height > 0;
        const disabled = !!el.disabled || el.getAttribute('aria-disabled') === 'true';
        out.push({{ element: {{ page: {page}, token: ref }}, visible, disabled }});
    }}
    return out;
}})()"#,
        find = FIND_FN,
        scope = scope_expr(scope),
        filter = filter,
        css = js_string(&rule.css()),
        attr = REF_ATTRIBUTE,
        page = page,
    )
}

/// Wraps `body` so it runs with `el` bound to the tagged element. The script
/// evaluates to `"detached"` when the element is gone, otherwise to whatever
/// `body` returns.
fn with_element(token: &str, body: &str) -> String {
    format!(
        r#"(() => {{
    {find}
    const el = __g2bFind(document, {token});
    if (!el) return "detached";
    {body}
}})()"#,
        find = FIND_FN,
        token = js_string(token),
        body = body,
    )
}

pub fn click(token: &str) -> String {
    with_element(
        token,
        r#"el.scrollIntoView({ block: 'center', inline: 'center' });
    const view = el.ownerDocument.defaultView || window;
    for (const type of ['mousedown', 'mouseup']) {
        el.dispatchEvent(new MouseEvent(type, { bubbles: true, cancelable: true, view }));
    }
    el.click();
    return "ok";"#,
    )
}

pub fn focus_and_clear(token: &str) -> String {
    with_element(
        token,
        r#"el.focus();
    if ('value' in el) {
        el.value = '';
        el.dispatchEvent(new Event('input', { bubbles: true }));
    }
    return "ok";"#,
    )
}

pub fn commit_input(token: &str) -> String {
    with_element(
        token,
        r#"el.dispatchEvent(new Event('change', { bubbles: true }));
    el.dispatchEvent(new KeyboardEvent('keyup', { bubbles: true }));
    return "ok";"#,
    )
}

pub fn force_value(token: &str, value: &str) -> String {
    with_element(
        token,
        &format!(
            r#"const value = {value};
    const desc = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value');
    if (desc && desc.set) {{ desc.set.call(el, value); }} else {{ el.value = value; }}
    for (const type of ['input', 'change', 'keyup']) {{
        el.dispatchEvent(new Event(type, {{ bubbles: true }}));
    }}
    return "ok";"#,
            value = js_string(value)
        ),
    )
}

pub fn force_check(token: &str) -> String {
    with_element(
        token,
        r#"el.checked = true;
    el.dispatchEvent(new Event('click', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    return "ok";"#,
    )
}

pub fn select_option(token: &str, value: &str) -> String {
    with_element(
        token,
        &format!(
            r#"const wanted = {value};
    const option = Array.from(el.options || []).find(
        (o) => o.value === wanted || (o.text || '').trim() === wanted
    );
    if (!option) return "missing-option";
    el.value = option.value;
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return "ok";"#,
            value = js_string(value)
        ),
    )
}

pub fn read_value(token: &str) -> String {
    with_element(
        token,
        r#"const value = ('value' in el) ? el.value : (el.innerText || el.textContent || '');
    return "value:" + String(value == null ? '' : value);"#,
    )
}

pub fn outer_html(token: &str) -> String {
    with_element(token, r#"return "html:" + el.outerHTML;"#)
}

pub const SCROLL_TO_END: &str =
    "(() => { window.scrollTo(0, document.body ? document.body.scrollHeight : 0); return true; })()";

/// Polls the resource timeline until nothing new has loaded for a second.
pub fn network_idle(timeout: Duration) -> String {
    let timeout_ms = timeout.as_millis().min(u128::from(u64::MAX)) as u64;
    format!(
        r#"(async () => {{
    const timeoutMs = {timeout_ms};
    const idleMs = 1000;
    const interval = 250;
    const start = Date.now();
    const count = () => {{
        try {{ return performance.getEntriesByType('resource').length; }} catch (_) {{ return 0; }}
    }};
    let last = count();
    let stable = 0;
    while (Date.now() - start < timeoutMs) {{
        await new Promise((r) => setTimeout(r, interval));
        const current = count();
        if (document.readyState === 'complete' && current === last) {{
            stable += interval;
            if (stable >= idleMs) return true;
        }} else {{
            stable = 0;
        }}
        last = current;
    }}
    return false;
}})()"#,
        timeout_ms = timeout_ms
    )
}
