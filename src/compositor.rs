// invoice-design-service/src/compositor.rs

use crate::designs::DesignVariant;

/// Join a variant's fragments into one template string, in head, header,
/// body, footer order. No placeholder evaluation happens here.
pub fn compose(variant: &DesignVariant) -> String {
    let mut template = String::with_capacity(
        variant.head.len() + variant.header.len() + variant.body.len() + variant.footer.len(),
    );
    template.push_str(&variant.head);
    template.push_str(&variant.header);
    template.push_str(&variant.body);
    template.push_str(&variant.footer);
    template
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::designs::get_variant;

    #[test]
    fn concatenates_in_document_order() {
        let variant = DesignVariant::custom("t", "<h>", "<hd>", "<b>", "<f>");
        assert_eq!(compose(&variant), "<h><hd><b><f>");
    }

    #[test]
    fn builtin_composition_is_a_full_document() {
        let html = compose(get_variant("Modern").unwrap());
        let head = html.find("</head>").unwrap();
        let body_open = html.find("<body").unwrap();
        let table = html.find("<table").unwrap();
        let footer = html.find("design-footer\"").unwrap();
        assert!(head < body_open && body_open < table && table < footer);
        assert!(html.trim_end().ends_with("</html>"));
    }
}
