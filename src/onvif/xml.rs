//! Minimal namespace-agnostic extraction from SOAP response bodies.
//!
//! ONVIF devices answer with whatever namespace prefixes their firmware
//! likes (`tds:`, `tt:`, `trt:`, none at all), so lookups match on the
//! local element name rather than parsing the document properly. This is
//! enough for the handful of fields the resolver reads.

/// Returns the text content of the first element whose local name matches
/// `tag`, regardless of namespace prefix.
pub fn element_text(xml: &str, tag: &str) -> Option<String> {
    for open in [format!("<{}>", tag), format!(":{}>", tag)] {
        if let Some(start) = xml.find(open.as_str()) {
            let content_start = start + open.len();
            if let Some(end) = xml[content_start..].find("</") {
                let value = xml[content_start..content_start + end].trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// Collects the value of `attr` from every element whose local name matches
/// `tag`, in document order. Used for profile `token` attributes.
pub fn attribute_values(xml: &str, tag: &str, attr: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut rest = xml;
    loop {
        let Some(lt) = rest.find('<') else { break };
        let after_lt = &rest[lt + 1..];
        let Some(gt) = after_lt.find('>') else { break };
        let element = &after_lt[..gt];

        if element_matches(element, tag) {
            if let Some(value) = attribute_in(element, attr) {
                values.push(value);
            }
        }
        rest = &after_lt[gt + 1..];
    }
    values
}

/// Returns the `XAddr` text inside the capability section named `category`
/// (e.g. `Media`), as reported by a `GetCapabilities` response.
pub fn capability_xaddr(xml: &str, category: &str) -> Option<String> {
    for open in [format!("<{}>", category), format!(":{}>", category)] {
        if let Some(start) = xml.find(open.as_str()) {
            let body = &xml[start + open.len()..];
            let end = body
                .find(&format!("</{}>", category))
                .or_else(|| body.find(&format!(":{}>", category)))?;
            return element_text(&body[..end], "XAddr");
        }
    }
    None
}

/// True if the document contains an element (opening or closing) whose
/// local name is exactly `tag`. Text content is never consulted, so payload
/// strings cannot masquerade as markup.
pub fn has_element(xml: &str, tag: &str) -> bool {
    let mut rest = xml;
    loop {
        let Some(lt) = rest.find('<') else {
            return false;
        };
        let after_lt = &rest[lt + 1..];
        let Some(gt) = after_lt.find('>') else {
            return false;
        };
        if element_matches(&after_lt[..gt], tag) {
            return true;
        }
        rest = &after_lt[gt + 1..];
    }
}

fn element_matches(element: &str, tag: &str) -> bool {
    let name = element
        .trim_start_matches('/')
        .split_whitespace()
        .next()
        .unwrap_or("");
    name == tag || name.ends_with(&format!(":{}", tag))
}

fn attribute_in(element: &str, attr: &str) -> Option<String> {
    let pattern = format!("{}=", attr);
    let start = element.find(&pattern)?;
    let after = &element[start + pattern.len()..];
    let quote = after.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let inner = &after[1..];
    let end = inner.find(quote)?;
    Some(inner[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_text_handles_namespace_prefixes() {
        let xml = "<tds:Manufacturer>HIKVISION</tds:Manufacturer>";
        assert_eq!(element_text(xml, "Manufacturer").as_deref(), Some("HIKVISION"));

        let xml = "<Model> DS-2CD2345 </Model>";
        assert_eq!(element_text(xml, "Model").as_deref(), Some("DS-2CD2345"));
    }

    #[test]
    fn element_text_misses_absent_tag() {
        assert_eq!(element_text("<a>b</a>", "Uri"), None);
    }

    #[test]
    fn attribute_values_collects_profile_tokens_in_order() {
        let xml = r#"
            <trt:Profiles token="Profile_1" fixed="true"><tt:Name>main</tt:Name></trt:Profiles>
            <trt:Profiles token="Profile_2"><tt:Name>sub</tt:Name></trt:Profiles>
        "#;
        assert_eq!(
            attribute_values(xml, "Profiles", "token"),
            vec!["Profile_1", "Profile_2"]
        );
    }

    #[test]
    fn attribute_values_ignores_other_elements() {
        let xml = r#"<tt:Name token="nope"/><trt:Profiles token="yes"/>"#;
        assert_eq!(attribute_values(xml, "Profiles", "token"), vec!["yes"]);
    }

    #[test]
    fn has_element_matches_local_names_only() {
        assert!(has_element("<s:Fault><s:Reason/></s:Fault>", "Fault"));
        assert!(has_element("<Fault/>", "Fault"));
        // Different local name, even when it contains the needle.
        assert!(!has_element("<tt:LastFault>ok</tt:LastFault>", "Fault"));
        // Text content is not markup.
        assert!(!has_element("<tt:Name>Fault></tt:Name>", "Fault"));
    }

    #[test]
    fn capability_xaddr_finds_media_service() {
        let xml = r#"
            <tt:Device><tt:XAddr>http://cam/onvif/device_service</tt:XAddr></tt:Device>
            <tt:Media><tt:XAddr>http://cam/onvif/media_service</tt:XAddr></tt:Media>
        "#;
        assert_eq!(
            capability_xaddr(xml, "Media").as_deref(),
            Some("http://cam/onvif/media_service")
        );
    }
}
