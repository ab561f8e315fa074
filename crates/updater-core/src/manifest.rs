//! The update decision and its wire XML rendering.

use crate::version::VersionKey;

/// Product name prefixed to every human version label.
pub const PRODUCT_NAME: &str = "Nextcloud";

/// An update offered to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateManifest {
    pub version: VersionKey,
    /// Human label, e.g. `8.0.9` or `daily`.
    pub label: String,
    pub url: String,
    pub web: String,
    pub autoupdater: bool,
    pub signature: Option<String>,
}

impl UpdateManifest {
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<nextcloud>\n");
        push_element(&mut xml, "version", &self.version.to_string());
        push_element(&mut xml, "versionstring", &format!("{PRODUCT_NAME} {}", self.label));
        push_element(&mut xml, "url", &self.url);
        push_element(&mut xml, "web", &self.web);
        push_element(&mut xml, "autoupdater", if self.autoupdater { "1" } else { "0" });
        if let Some(signature) = &self.signature {
            push_element(&mut xml, "signature", signature);
        }
        xml.push_str("</nextcloud>\n");
        xml
    }
}

fn push_element(xml: &mut String, name: &str, text: &str) {
    xml.push_str(&format!(" <{name}>{}</{name}>\n", escape_text(text)));
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Outcome of an update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateDecision {
    NoUpdate,
    Update(UpdateManifest),
}

impl UpdateDecision {
    /// Wire form: the manifest XML, or the empty string for "no update".
    pub fn render(&self) -> String {
        match self {
            UpdateDecision::NoUpdate => String::new(),
            UpdateDecision::Update(manifest) => manifest.to_xml(),
        }
    }

    pub fn manifest(&self) -> Option<&UpdateManifest> {
        match self {
            UpdateDecision::NoUpdate => None,
            UpdateDecision::Update(manifest) => Some(manifest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> UpdateManifest {
        UpdateManifest {
            version: "11.0.1".parse().unwrap(),
            label: "11.0.1".to_string(),
            url: "https://download.nextcloud.com/server/releases/nextcloud-11.0.1.zip".to_string(),
            web: "https://docs.nextcloud.com/server/11/admin_manual/maintenance/upgrade.html"
                .to_string(),
            autoupdater: true,
            signature: Some("MySignature".to_string()),
        }
    }

    #[test]
    fn renders_wire_layout_with_signature() {
        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<nextcloud>
 <version>11.0.1</version>
 <versionstring>Nextcloud 11.0.1</versionstring>
 <url>https://download.nextcloud.com/server/releases/nextcloud-11.0.1.zip</url>
 <web>https://docs.nextcloud.com/server/11/admin_manual/maintenance/upgrade.html</web>
 <autoupdater>1</autoupdater>
 <signature>MySignature</signature>
</nextcloud>
"#;
        assert_eq!(manifest().to_xml(), expected);
    }

    #[test]
    fn omits_absent_signature() {
        let xml = UpdateManifest {
            signature: None,
            autoupdater: false,
            ..manifest()
        }
        .to_xml();
        assert!(!xml.contains("<signature>"));
        assert!(xml.contains(" <autoupdater>0</autoupdater>\n</nextcloud>\n"));
    }

    #[test]
    fn escapes_markup_in_text() {
        let xml = UpdateManifest {
            url: "https://example.org/get?a=1&b=<2>".to_string(),
            ..manifest()
        }
        .to_xml();
        assert!(xml.contains("<url>https://example.org/get?a=1&amp;b=&lt;2&gt;</url>"));
    }

    #[test]
    fn no_update_renders_empty() {
        assert_eq!(UpdateDecision::NoUpdate.render(), "");
        assert!(UpdateDecision::NoUpdate.manifest().is_none());
        assert_eq!(
            UpdateDecision::Update(manifest()).manifest().map(|m| m.label.as_str()),
            Some("11.0.1")
        );
    }
}
