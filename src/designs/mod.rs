// invoice-design-service/src/designs/mod.rs

//! Built-in design catalogue.
//!
//! Every variant is split into four fragments that are only valid HTML once
//! concatenated in head, header, body, footer order: the head closes
//! `</head>`, the header opens `<body>`, and the footer closes both `<body>`
//! and `<html>`. Fragments are not validated structurally on their own.

use crate::error::{DocumentError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A named layout made of four template fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignVariant {
    pub name: Cow<'static, str>,
    pub head: Cow<'static, str>,
    pub header: Cow<'static, str>,
    pub body: Cow<'static, str>,
    pub footer: Cow<'static, str>,
}

impl DesignVariant {
    const fn builtin(
        name: &'static str,
        head: &'static str,
        header: &'static str,
        body: &'static str,
        footer: &'static str,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            head: Cow::Borrowed(head),
            header: Cow::Borrowed(header),
            body: Cow::Borrowed(body),
            footer: Cow::Borrowed(footer),
        }
    }

    /// A caller-supplied design. It goes through the same restricted
    /// template grammar as the built-in ones.
    pub fn custom(
        name: impl Into<String>,
        head: impl Into<String>,
        header: impl Into<String>,
        body: impl Into<String>,
        footer: impl Into<String>,
    ) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            head: Cow::Owned(head.into()),
            header: Cow::Owned(header.into()),
            body: Cow::Owned(body.into()),
            footer: Cow::Owned(footer.into()),
        }
    }
}

macro_rules! builtin_design {
    ($name:literal, $dir:literal) => {
        DesignVariant::builtin(
            $name,
            include_str!(concat!("../../templates/", $dir, "/head.html")),
            include_str!(concat!("../../templates/", $dir, "/header.html")),
            include_str!(concat!("../../templates/", $dir, "/body.html")),
            include_str!(concat!("../../templates/", $dir, "/footer.html")),
        )
    };
}

static MODERN: DesignVariant = builtin_design!("Modern", "modern");
static BOLD: DesignVariant = builtin_design!("Bold", "bold");
static PLAIN: DesignVariant = builtin_design!("Plain", "plain");
static CLEAN: DesignVariant = builtin_design!("Clean", "clean");

static VARIANTS: [&DesignVariant; 4] = [&MODERN, &BOLD, &PLAIN, &CLEAN];

/// All built-in variants, in catalogue order.
pub fn variants() -> impl Iterator<Item = &'static DesignVariant> {
    VARIANTS.iter().copied()
}

/// Look up a built-in variant by name, ignoring ASCII case.
pub fn get_variant(name: &str) -> Result<&'static DesignVariant> {
    let wanted = name.trim();
    variants()
        .find(|variant| variant.name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| DocumentError::DesignNotFound(name.to_string()))
}
