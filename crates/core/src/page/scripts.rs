//! Page-side function bodies used by [`Page`](super::Page) and
//! [`ElementHandle`](super::ElementHandle).
//!
//! Functions taking `this` are invoked with `Runtime.callFunctionOn` against
//! an element's remote object.

/// Collects elements matching a CSS selector (argument 0) into an array.
pub(crate) const QUERY_CSS: &str = "function(selector) { return Array.from(document.querySelectorAll(selector)); }";

/// Collects nodes matching an XPath expression (argument 0) into an array,
/// in document order.
pub(crate) const QUERY_XPATH: &str = r#"function(expression) {
	const snapshot = document.evaluate(expression, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
	const nodes = [];
	for (let i = 0; i < snapshot.snapshotLength; i++) nodes.push(snapshot.snapshotItem(i));
	return nodes;
}"#;

/// First element matching a CSS selector (argument 0), or null.
pub(crate) const QUERY_FIRST_CSS: &str = "function(selector) { return document.querySelector(selector); }";

/// First node in document order matching an XPath expression, or null.
pub(crate) const QUERY_FIRST_XPATH: &str =
	"function(expression) { return document.evaluate(expression, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue; }";

pub(crate) const TEXT_CONTENT: &str = "function() { return this.textContent; }";

/// Attribute value by name (argument 0), or null.
pub(crate) const ATTRIBUTE: &str = "function(name) { return this.getAttribute ? this.getAttribute(name) : null; }";

/// Scrolls the element into view and returns its centre, or a string reason.
pub(crate) const SCROLL_AND_CENTER: &str = r#"function() {
	if (!this.isConnected) return 'detached';
	this.scrollIntoView({ block: 'center', inline: 'center', behavior: 'instant' });
	const rect = this.getBoundingClientRect();
	if (rect.width === 0 && rect.height === 0) return 'no layout';
	return { x: rect.left + rect.width / 2, y: rect.top + rect.height / 2 };
}"#;

/// Focuses the element and selects its current content so the next text
/// insertion replaces it. Returns `'ok'` or a string reason.
///
/// Inserted text goes to `document.activeElement`, so an element that does
/// not keep focus is reported instead of typed past.
pub(crate) const PREPARE_FILL: &str = r#"function() {
	if (!this.isConnected) return 'detached';
	const textTypes = ['', 'text', 'search', 'email', 'url', 'tel', 'password', 'number'];
	if (this instanceof HTMLInputElement || this instanceof HTMLTextAreaElement) {
		if (this instanceof HTMLInputElement && !textTypes.includes(this.type)) return 'input of type ' + this.type + ' does not accept text';
		if (this.disabled || this.readOnly) return 'not editable';
		this.focus();
		if (document.activeElement !== this) return 'element did not take focus';
		this.select();
		return 'ok';
	}
	if (this.isContentEditable) {
		this.focus();
		if (!this.contains(document.activeElement)) return 'element did not take focus';
		const range = document.createRange();
		range.selectNodeContents(this);
		const selection = window.getSelection();
		selection.removeAllRanges();
		selection.addRange(range);
		return 'ok';
	}
	return 'not an input, textarea or editable region';
}"#;

/// Clears the current selection inside the focused element.
pub(crate) const DELETE_SELECTION: &str = "function() { document.execCommand('delete', false, null); return true; }";
