use crate::browser::PageScript;

/// Collects computed-style records for the first `arguments[0]` elements in
/// document order, plus every stylesheet and script URL on the page.
pub(crate) const STYLE_SAMPLER: PageScript = PageScript {
    name: "style sampler",
    source: r#"
const limit = arguments[0];
const all = document.querySelectorAll('*');
const count = Math.min(all.length, limit);
const elements = [];

for (let i = 0; i < count; i++) {
    const el = all[i];
    const style = window.getComputedStyle(el);
    const className = typeof el.className === 'string'
        ? el.className
        : (el.getAttribute('class') || '');
    elements.push({
        tag: el.tagName.toLowerCase(),
        role: el.getAttribute('role'),
        className: className,
        dataComponent: el.getAttribute('data-component'),
        backgroundColor: style.backgroundColor,
        color: style.color,
        borderColor: style.borderColor,
        fontFamily: style.fontFamily,
        fontSize: style.fontSize,
        padding: style.padding,
        margin: style.margin,
        gap: style.gap,
        display: style.display
    });
}

const assets = [];
document.querySelectorAll('link[href]').forEach(l => assets.push(l.getAttribute('href')));
document.querySelectorAll('script[src]').forEach(s => assets.push(s.getAttribute('src')));

return { elements: elements, assets: assets };
"#,
};
