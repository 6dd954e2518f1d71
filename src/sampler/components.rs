use super::ElementSample;

/// Maps markup features to a semantic component label
#[derive(Debug)]
pub struct ComponentRule {
    pub label: &'static str,
    pub tags: &'static [&'static str],
    pub roles: &'static [&'static str],
    /// Substrings matched case-insensitively against `class` and `data-component`
    pub hints: &'static [&'static str],
}

pub static COMPONENT_RULES: &[ComponentRule] = &[
    ComponentRule {
        label: "navigation",
        tags: &["nav"],
        roles: &["navigation"],
        hints: &[],
    },
    ComponentRule {
        label: "header",
        tags: &["header"],
        roles: &["banner"],
        hints: &[],
    },
    ComponentRule {
        label: "footer",
        tags: &["footer"],
        roles: &["contentinfo"],
        hints: &[],
    },
    ComponentRule {
        label: "sidebar",
        tags: &["aside"],
        roles: &["complementary"],
        hints: &["sidebar"],
    },
    ComponentRule {
        label: "form",
        tags: &["form"],
        roles: &["form"],
        hints: &[],
    },
    ComponentRule {
        label: "button",
        tags: &["button"],
        roles: &["button"],
        hints: &[],
    },
    ComponentRule {
        label: "form-input",
        tags: &["input", "select", "textarea"],
        roles: &["textbox", "combobox"],
        hints: &[],
    },
    ComponentRule {
        label: "image",
        tags: &["img", "picture"],
        roles: &["img"],
        hints: &[],
    },
    ComponentRule {
        label: "table",
        tags: &["table"],
        roles: &["table", "grid"],
        hints: &[],
    },
    ComponentRule {
        label: "list",
        tags: &["ul", "ol"],
        roles: &["list"],
        hints: &[],
    },
    ComponentRule {
        label: "card",
        tags: &[],
        roles: &[],
        hints: &["card"],
    },
    ComponentRule {
        label: "modal",
        tags: &["dialog"],
        roles: &["dialog"],
        hints: &["modal"],
    },
    ComponentRule {
        label: "hero",
        tags: &[],
        roles: &[],
        hints: &["hero"],
    },
    ComponentRule {
        label: "tabs",
        tags: &[],
        roles: &["tablist"],
        hints: &["tabs"],
    },
    ComponentRule {
        label: "accordion",
        tags: &["details"],
        roles: &[],
        hints: &["accordion"],
    },
];

impl ComponentRule {
    pub fn matches(&self, element: &ElementSample) -> bool {
        if self.tags.contains(&element.tag.as_str()) {
            return true;
        }
        let role = element.role.as_deref().unwrap_or_default();
        if self.roles.iter().any(|r| r.eq_ignore_ascii_case(role)) {
            return true;
        }
        if self.hints.is_empty() {
            return false;
        }

        let class_name = element.class_name.to_lowercase();
        let data_component = element
            .data_component
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        self.hints
            .iter()
            .any(|hint| class_name.contains(hint) || data_component.contains(hint))
    }
}

/// Labels of every rule the element satisfies, in table order
pub fn detect(element: &ElementSample) -> impl Iterator<Item = &'static str> + '_ {
    COMPONENT_RULES
        .iter()
        .filter(|rule| rule.matches(element))
        .map(|rule| rule.label)
}

/// CSS framework fingerprints looked for in stylesheet and script URLs
pub static FRAMEWORK_FINGERPRINTS: &[(&str, &str)] = &[
    ("tailwind", "tailwind"),
    ("bootstrap", "bootstrap"),
    ("material", "material"),
    ("chakra", "chakra"),
];

/// Framework names in the order their assets appear; may repeat
pub fn detect_frameworks<S: AsRef<str>>(assets: &[S]) -> Vec<&'static str> {
    let mut found = Vec::new();
    for asset in assets {
        let asset = asset.as_ref().to_lowercase();
        for (needle, name) in FRAMEWORK_FINGERPRINTS {
            if asset.contains(needle) {
                found.push(*name);
            }
        }
    }
    found
}
