//! Selector fallback chains as data.
//!
//! The admin UI is versioned and A/B-tested, so no single selector is
//! reliable. Each UI step carries an ordered list of candidate locators;
//! the first that clicks within its window advances the state machine.
//! New candidates are added to these tables, never to control flow.

/// One way of finding a UI element.
#[derive(Debug, Clone, Copy)]
pub enum Locator {
    /// A plain CSS selector.
    Css(&'static str),
    /// Elements matching `within`, filtered by trimmed text content
    /// (case-insensitive substring).
    Text {
        within: &'static str,
        needle: &'static str,
    },
    /// A raw JS snippet evaluating to `{ success: bool }`, for compound
    /// interactions a single selector cannot express.
    Js(&'static str),
}

/// One step of the export flow: a capability plus its candidate locators.
#[derive(Debug, Clone, Copy)]
pub struct StepSpec {
    pub name: &'static str,
    pub candidates: &'static [Locator],
    /// Steps that some UI versions simply do not have (e.g. a format picker
    /// when CSV is the only format) may fail without failing the week.
    pub required: bool,
}

/// Overflow-menu path: some report layouts tuck Export behind "More actions".
const OVERFLOW_THEN_EXPORT_JS: &str = r#"(() => {
    const more = document.querySelector("button[aria-label='More actions'], button[aria-haspopup='menu']");
    if (!more) return { success: false };
    more.click();
    const item = [...document.querySelectorAll("button, [role='menuitem']")]
        .find(el => el.textContent.trim().toLowerCase().includes('export'));
    if (!item) return { success: false };
    item.click();
    return { success: true };
})()"#;

/// Open the export dialog from the report page.
pub const OPEN_EXPORT_DIALOG: StepSpec = StepSpec {
    name: "export-dialog",
    candidates: &[
        Locator::Text {
            within: "button",
            needle: "export",
        },
        Locator::Css("button[aria-label='Export']"),
        Locator::Text {
            within: "[role='button']",
            needle: "export",
        },
        Locator::Js(OVERFLOW_THEN_EXPORT_JS),
    ],
    required: true,
};

/// Pick the CSV format inside the dialog, when the dialog offers one.
pub const CHOOSE_CSV_FORMAT: StepSpec = StepSpec {
    name: "format-csv",
    candidates: &[
        Locator::Text {
            within: "[role='menuitem']",
            needle: "csv",
        },
        Locator::Text {
            within: "div[role='dialog'] button",
            needle: "csv",
        },
        Locator::Text {
            within: "label",
            needle: "csv",
        },
    ],
    required: false,
};

/// Confirm the export (the dialog's own Export button).
pub const CONFIRM_EXPORT: StepSpec = StepSpec {
    name: "export-confirm",
    candidates: &[
        Locator::Text {
            within: "div[role='dialog'] button",
            needle: "export",
        },
        Locator::Text {
            within: "button",
            needle: "export",
        },
        Locator::Css("button[aria-label='Export']"),
    ],
    required: true,
};

/// Submit whatever login step is on screen.
pub const LOGIN_SUBMIT: StepSpec = StepSpec {
    name: "login-submit",
    candidates: &[
        Locator::Css("button[type='submit']"),
        Locator::Css("button[name='commit']"),
        Locator::Text {
            within: "button",
            needle: "continue",
        },
        Locator::Text {
            within: "button",
            needle: "log in",
        },
        Locator::Text {
            within: "button",
            needle: "next",
        },
    ],
    required: true,
};

/// Login form fields (selector lists, probed rather than clicked).
pub const EMAIL_FIELD: &str =
    "input[name='account_email'], input[id='account_email'], input[placeholder*='email' i]";
pub const PASSWORD_FIELD: &str =
    "input[name='account_password'], input[id='account_password'], input[type='password']";
pub const OTP_FIELD: &str =
    "input[name='two_factor_code'], input[name='otp'], input[placeholder*='code' i]";

/// Marker that the admin shell (not the login screen) is on screen.
pub const ADMIN_MARKER: &str = "nav[aria-label='Primary'], #AppFrameMain";

/// Marker that the report page has rendered something interactive.
pub const REPORT_MARKER: &str = "button";

/// JS probe: does any element match the selector?
pub fn probe_js(selector: &str) -> String {
    format!(
        "!!document.querySelector('{}')",
        sanitize_js_string(selector)
    )
}

/// JS to click the first match of a locator, returning `{ success }`.
pub fn click_js(locator: &Locator) -> String {
    match locator {
        Locator::Css(selector) => format!(
            r#"(() => {{
                const el = document.querySelector('{}');
                if (el) {{ el.click(); return {{ success: true }}; }}
                return {{ success: false }};
            }})()"#,
            sanitize_js_string(selector)
        ),
        Locator::Text { within, needle } => format!(
            r#"(() => {{
                const el = [...document.querySelectorAll('{}')]
                    .find(e => e.textContent.trim().toLowerCase().includes('{}'));
                if (el) {{ el.click(); return {{ success: true }}; }}
                return {{ success: false }};
            }})()"#,
            sanitize_js_string(within),
            sanitize_js_string(needle)
        ),
        Locator::Js(snippet) => (*snippet).to_string(),
    }
}

/// JS to fill the first match of a selector list and fire input events.
pub fn fill_js(selector: &str, value: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector('{}');
            if (el) {{
                el.value = '{}';
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return {{ success: true }};
            }}
            return {{ success: false }};
        }})()"#,
        sanitize_js_string(selector),
        sanitize_js_string(value)
    )
}

/// Sanitize a string for safe injection into a JS string literal.
///
/// Escapes everything that could break out of string context; strips null
/// bytes; hex-escapes angle brackets so a reflected value cannot form a
/// script tag.
pub fn sanitize_js_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '`' => result.push_str("\\`"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => {}
            '<' => result.push_str("\\x3c"),
            '>' => result.push_str("\\x3e"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_escapes_quotes() {
        assert_eq!(sanitize_js_string("hello"), "hello");
        assert_eq!(sanitize_js_string("it's"), "it\\'s");
        assert_eq!(sanitize_js_string("a\"b"), "a\\\"b");
        assert_eq!(sanitize_js_string("a\0b"), "ab");
    }

    #[test]
    fn test_sanitize_blocks_script_tags() {
        let out = sanitize_js_string("</script><script>");
        assert!(!out.contains("</script>"));
        assert!(out.contains("\\x3c"));
    }

    #[test]
    fn test_click_js_css_embeds_selector() {
        let js = click_js(&Locator::Css("button[aria-label='Export']"));
        assert!(js.contains("button[aria-label=\\'Export\\']"));
        assert!(js.contains(".click()"));
    }

    #[test]
    fn test_click_js_text_lowercases_via_needle() {
        let js = click_js(&Locator::Text {
            within: "button",
            needle: "export",
        });
        assert!(js.contains("toLowerCase()"));
        assert!(js.contains("includes('export')"));
    }

    #[test]
    fn test_fill_js_dispatches_input_event() {
        let js = fill_js(EMAIL_FIELD, "user@example.com");
        assert!(js.contains("new Event('input'"));
        assert!(js.contains("user@example.com"));
    }

    #[test]
    fn test_export_steps_have_candidates() {
        for step in [OPEN_EXPORT_DIALOG, CHOOSE_CSV_FORMAT, CONFIRM_EXPORT] {
            assert!(!step.candidates.is_empty(), "step {} is empty", step.name);
        }
        assert!(OPEN_EXPORT_DIALOG.required);
        assert!(!CHOOSE_CSV_FORMAT.required);
    }
}
