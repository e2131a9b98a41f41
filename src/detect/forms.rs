//! HTML forms and where they submit

use serde::Serialize;

use super::capture_or_empty;

/// One `<form>` element
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Form {
    /// `action` attribute, empty when the form posts to the page itself
    pub action: String,
}

/// Every form of the main document, in document order
pub fn detect(html: &str) -> Vec<Form> {
    let form_tag = pattern!(r"<form[^>]*>");
    let action = pattern!(r#"\saction="([^"]*)""#);

    let Some(form_tag) = form_tag else {
        return Vec::new();
    };
    form_tag
        .find_iter(html)
        .map(|tag| Form {
            action: capture_or_empty(action, tag.as_str(), 1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forms_with_and_without_action() {
        let html = r#"<form method="post" action="https://crm.example.net/subscribe"><input name="email"></form>
<form class="search"><input name="q"></form>"#;
        let forms = detect(html);
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].action, "https://crm.example.net/subscribe");
        assert_eq!(forms[1].action, "");
    }

    #[test]
    fn test_no_form() {
        assert!(detect("<p>formulaire</p>").is_empty());
    }
}
