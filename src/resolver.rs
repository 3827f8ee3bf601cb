// invoice-design-service/src/resolver.rs

//! Placeholder resolution.
//!
//! Turns a [`Document`] plus an optional recipient into the label and value
//! mappings a design template is rendered against. Labels come from the
//! locale catalog; values are formatted with the customer's locale and
//! currency. Every user-supplied string is HTML-escaped here, so the
//! template renderer can insert values verbatim.

use crate::document::{Contact, Document, TaxRate};
use crate::locale::{
    currency, format_amount, format_date, format_quantity, Locale, LocaleCatalog, Money,
    NumberFormat,
};
use crate::substitution::{LineItemContext, LineItemRow, SubstitutionSet};
use chrono::NaiveDate;
use handlebars::html_escape;
use tracing::debug;

/// Translation keys exposed to designs as `$<key>_label`.
pub const LABEL_KEYS: &[&str] = &[
    "invoice",
    "quote",
    "credit",
    "po_number",
    "due_date",
    "valid_until",
    "balance_due",
    "subtotal",
    "discount",
    "total",
    "paid_to_date",
    "terms",
    "public_notes",
    "footer",
    "item",
    "description",
    "unit_cost",
    "quantity",
    "tax",
    "line_total",
    "client",
    "contact",
    "email",
    "phone",
    "website",
    "vat_number",
    "address",
    "from",
    "to",
];

const DEFAULT_CURRENCY: &str = "USD";

/// Output of [`Resolver::resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub substitutions: SubstitutionSet,
    pub line_items: LineItemContext,
    pub totals: Totals,
}

/// A tax name/rate pair and the amount it contributes.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxLine {
    pub name: String,
    pub rate: f64,
    pub amount: Money,
}

/// Document arithmetic, computed in whole cents.
#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    /// Per line, after the line's own discount and before tax.
    pub line_totals: Vec<Money>,
    pub subtotal: Money,
    pub discount: Money,
    /// Line-level taxes grouped by name and rate, in first-seen order.
    pub line_taxes: Vec<TaxLine>,
    /// Document-level taxes on the discounted subtotal.
    pub document_taxes: Vec<TaxLine>,
    pub total: Money,
    pub paid_to_date: Money,
    pub balance: Money,
}

impl Totals {
    pub fn compute(document: &Document) -> Self {
        let mut line_totals = Vec::with_capacity(document.line_items.len());
        let mut line_taxes: Vec<TaxLine> = Vec::new();

        for item in &document.line_items {
            let line_total =
                Money::from_decimal(item.cost).times(item.quantity) - Money::from_decimal(item.discount);
            for rate in &item.tax_rates {
                add_tax(&mut line_taxes, rate, line_total.percent(rate.rate));
            }
            line_totals.push(line_total);
        }

        let subtotal: Money = line_totals.iter().copied().sum();
        let discount = if document.is_amount_discount {
            Money::from_decimal(document.discount)
        } else {
            subtotal.percent(document.discount)
        };
        let taxable = subtotal - discount;

        let mut document_taxes = Vec::new();
        for rate in &document.tax_rates {
            add_tax(&mut document_taxes, rate, taxable.percent(rate.rate));
        }

        let total = taxable
            + line_taxes.iter().map(|t| t.amount).sum::<Money>()
            + document_taxes.iter().map(|t| t.amount).sum::<Money>();
        let paid_to_date = Money::from_decimal(document.paid_to_date);

        Self {
            line_totals,
            subtotal,
            discount,
            line_taxes,
            document_taxes,
            total,
            paid_to_date,
            balance: total - paid_to_date,
        }
    }
}

fn add_tax(taxes: &mut Vec<TaxLine>, rate: &TaxRate, amount: Money) {
    if rate.name.trim().is_empty() && rate.rate == 0.0 {
        return;
    }
    match taxes
        .iter_mut()
        .find(|t| t.name == rate.name && t.rate == rate.rate)
    {
        Some(existing) => existing.amount = existing.amount + amount,
        None => taxes.push(TaxLine {
            name: rate.name.clone(),
            rate: rate.rate,
            amount,
        }),
    }
}

/// Formats money, quantities and dates for one locale/currency pair.
struct Formatter<'a> {
    number: &'a NumberFormat,
    date: &'a str,
    symbol: String,
    precision: u32,
}

impl Formatter<'_> {
    fn money(&self, amount: Money) -> String {
        format_amount(amount, &self.symbol, self.precision, self.number)
    }

    fn quantity(&self, value: f64) -> String {
        format_quantity(value, self.number)
    }

    fn date(&self, date: NaiveDate) -> String {
        format_date(date, self.date)
    }

    fn tax_label(&self, tax: &TaxLine) -> String {
        format!("{} {}%", html_escape(tax.name.trim()), self.quantity(tax.rate))
    }
}

fn escape_multiline(text: &str) -> String {
    text.trim()
        .lines()
        .map(|line| html_escape(line.trim_end()))
        .collect::<Vec<_>>()
        .join("<br>\n")
}

fn spans<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| format!("<span>{}</span>", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Builds substitution sets from documents using a locale catalog.
pub struct Resolver<'a> {
    catalog: &'a LocaleCatalog,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a LocaleCatalog) -> Self {
        Self { catalog }
    }

    /// Resolve with the locale from the customer's settings.
    pub fn resolve(&self, document: &Document, recipient: Option<&Contact>) -> Resolution {
        let locale = self
            .catalog
            .locale(document.customer.settings.locale.as_deref());
        self.resolve_with_locale(document, recipient, &locale)
    }

    pub fn resolve_with_locale(
        &self,
        document: &Document,
        recipient: Option<&Contact>,
        locale: &Locale<'_>,
    ) -> Resolution {
        let mut set = SubstitutionSet::new(locale.code());
        if !locale.is_known() {
            set.warn(
                "$locale",
                format!(
                    "unknown locale `{}`, using `{}`",
                    locale.code(),
                    self.catalog.fallback()
                ),
            );
        }

        let formatter = self.formatter(document, locale, &mut set);
        let totals = Totals::compute(document);

        insert_labels(&mut set, document, locale);
        insert_entity_values(&mut set, document, &totals, &formatter);
        insert_party_values(&mut set, document, recipient);
        let line_items = line_item_rows(document, &totals, &formatter);

        debug!(
            document_number = %document.number,
            locale = %locale.code(),
            labels = set.labels().len(),
            values = set.values().len(),
            line_items = line_items.len(),
            warnings = set.warnings().len(),
            "Resolved substitutions"
        );

        Resolution {
            substitutions: set,
            line_items,
            totals,
        }
    }

    fn formatter<'l>(
        &self,
        document: &Document,
        locale: &Locale<'l>,
        set: &mut SubstitutionSet,
    ) -> Formatter<'l> {
        let code = document
            .customer
            .settings
            .currency
            .as_deref()
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let (symbol, precision) = match currency(&code) {
            Some(known) => (known.symbol.to_string(), known.precision),
            None => {
                set.warn(
                    "$currency_code",
                    format!("unknown currency `{}`, amounts shown with the code", code),
                );
                (code.clone(), 2)
            }
        };
        set.insert_value("$currency_code", html_escape(&code));

        Formatter {
            number: locale.number_format(),
            date: locale.date_format(),
            symbol,
            precision,
        }
    }
}

fn translate(set: &mut SubstitutionSet, locale: &Locale<'_>, key: &str) -> String {
    match locale.translate(key) {
        Some(text) => text.to_string(),
        None => {
            set.warn(
                &format!("${}_label", key),
                format!("missing translation for `{}`", key),
            );
            key.to_string()
        }
    }
}

fn insert_labels(set: &mut SubstitutionSet, document: &Document, locale: &Locale<'_>) {
    for key in LABEL_KEYS {
        let text = translate(set, locale, key);
        set.insert_label(&format!("${}_label", key), html_escape(&text));
    }

    let kind = document.kind.key();
    let entity = translate(set, locale, kind);
    let number = translate(set, locale, &format!("{}_number", kind));
    let date = translate(set, locale, &format!("{}_date", kind));
    let due_date = translate(set, locale, document.kind.due_date_key());

    set.insert_label("$entity_label", html_escape(&entity));
    set.insert_label("$number_label", html_escape(&number));
    set.insert_label("$date_label", html_escape(&date));
    set.insert_label("$due_date_label", html_escape(&due_date));
}

fn insert_entity_values(
    set: &mut SubstitutionSet,
    document: &Document,
    totals: &Totals,
    fmt: &Formatter<'_>,
) {
    let number = html_escape(document.number.trim());
    set.insert_value("$number", number.clone());
    set.insert_value("$entity.number", number.clone());
    let locale = html_escape(set.locale());
    set.insert_value("$locale", locale);

    let po_number = non_empty(&document.po_number).map(html_escape);
    set.insert_value("$po_number", po_number.clone().unwrap_or_default());

    let date = document.date.map(|d| fmt.date(d));
    if date.is_none() {
        set.warn("$date", "document has no date");
    }
    set.insert_value("$date", date.clone().unwrap_or_default());

    let due_date = document.due_date.map(|d| fmt.date(d));
    set.insert_value("$due_date", due_date.clone().unwrap_or_default());

    set.insert_value("$subtotal", fmt.money(totals.subtotal));
    set.insert_value("$discount", fmt.money(totals.discount));
    set.insert_value("$total", fmt.money(totals.total));
    set.insert_value("$paid_to_date", fmt.money(totals.paid_to_date));
    set.insert_value("$balance_due", fmt.money(totals.balance));

    set.insert_value("$entity.subtotal", totals.subtotal.to_decimal_string());
    set.insert_value("$entity.discount", totals.discount.to_decimal_string());
    set.insert_value("$entity.amount", totals.total.to_decimal_string());
    set.insert_value("$entity.paid_to_date", totals.paid_to_date.to_decimal_string());
    set.insert_value("$entity.balance", totals.balance.to_decimal_string());

    set.insert_value(
        "$line_tax_labels",
        spans(totals.line_taxes.iter().map(|t| fmt.tax_label(t))),
    );
    set.insert_value(
        "$line_tax_values",
        spans(totals.line_taxes.iter().map(|t| fmt.money(t.amount))),
    );
    set.insert_value(
        "$total_tax_labels",
        spans(totals.document_taxes.iter().map(|t| fmt.tax_label(t))),
    );
    set.insert_value(
        "$total_tax_values",
        spans(totals.document_taxes.iter().map(|t| fmt.money(t.amount))),
    );
    let has_line_taxes = document.line_items.iter().any(|i| !i.tax_rates.is_empty());
    set.insert_value("$has_line_taxes", has_line_taxes.to_string());

    let text = |value: &Option<String>| value.as_deref().map(escape_multiline).unwrap_or_default();
    set.insert_value("$entity.public_notes", text(&document.public_notes));
    set.insert_value("$terms", text(&document.terms));
    set.insert_value("$footer", text(&document.footer));

    // Balance due is rendered by the footer, never in the details block.
    let mut rows: Vec<(String, String)> = Vec::new();
    rows.push((label(set, "$number_label"), number));
    if let Some(po) = po_number {
        rows.push((label(set, "$po_number_label"), po));
    }
    if let Some(date) = date {
        rows.push((label(set, "$date_label"), date));
    }
    if let Some(due) = due_date {
        rows.push((label(set, "$due_date_label"), due));
    }
    set.insert_value("$entity_labels", spans(rows.iter().map(|(l, _)| l)));
    set.insert_value("$entity_details", spans(rows.iter().map(|(_, v)| v)));
}

fn label(set: &SubstitutionSet, key: &str) -> String {
    set.get(key).unwrap_or_default().to_string()
}

fn insert_party_values(set: &mut SubstitutionSet, document: &Document, recipient: Option<&Contact>) {
    let customer = &document.customer;
    let company = &document.company;

    let client_name = html_escape(customer.name.trim());
    if client_name.is_empty() {
        set.warn("$client.name", "customer has no name");
    }
    let client_fields = [
        ("number", non_empty(&customer.number)),
        ("email", non_empty(&customer.email)),
        ("phone", non_empty(&customer.phone)),
        ("website", non_empty(&customer.website)),
        ("vat_number", non_empty(&customer.vat_number)),
        ("address1", non_empty(&customer.address.address1)),
        ("address2", non_empty(&customer.address.address2)),
        ("city", non_empty(&customer.address.city)),
        ("state", non_empty(&customer.address.state)),
        ("postal_code", non_empty(&customer.address.postal_code)),
        ("country", non_empty(&customer.address.country)),
    ];
    set.insert_value("$client.name", client_name.clone());
    for (field, value) in client_fields {
        set.insert_value(
            &format!("$client.{}", field),
            value.map(html_escape).unwrap_or_default(),
        );
    }
    if non_empty(&customer.email).is_none() {
        set.warn("$client.email", "customer has no email address");
    }

    let mut client_details = vec![client_name];
    client_details.extend(customer.address.lines().iter().map(|l| html_escape(l)));
    for value in [&customer.email, &customer.phone, &customer.vat_number] {
        if let Some(v) = non_empty(value) {
            client_details.push(html_escape(v));
        }
    }
    set.insert_value(
        "$client_details",
        spans(client_details.iter().filter(|l| !l.is_empty())),
    );

    let company_name = html_escape(company.name.trim());
    if company_name.is_empty() {
        set.warn("$company.name", "company has no name");
    }
    set.insert_value("$company.name", company_name.clone());
    let company_fields = [
        ("email", non_empty(&company.email)),
        ("phone", non_empty(&company.phone)),
        ("website", non_empty(&company.website)),
        ("vat_number", non_empty(&company.vat_number)),
    ];
    let mut company_details = vec![company_name.clone()];
    for (field, value) in company_fields {
        let escaped = value.map(html_escape).unwrap_or_default();
        if !escaped.is_empty() {
            company_details.push(escaped.clone());
        }
        set.insert_value(&format!("$company.{}", field), escaped);
    }
    set.insert_value(
        "$company_details",
        spans(company_details.iter().filter(|l| !l.is_empty())),
    );
    set.insert_value(
        "$company_address",
        spans(company.address.lines().iter().map(|l| html_escape(l))),
    );
    let logo = non_empty(&company.logo_url)
        .map(|url| {
            format!(
                "<img src=\"{}\" alt=\"{}\" class=\"company-logo\">",
                html_escape(url),
                company_name
            )
        })
        .unwrap_or_default();
    set.insert_value("$company_logo", logo);

    match recipient {
        Some(contact) => {
            let name = contact.full_name();
            let name = if name.is_empty() {
                customer.name.trim().to_string()
            } else {
                name
            };
            set.insert_value("$contact.name", html_escape(&name));
            set.insert_value("$contact.first_name", html_escape(contact.first_name.trim()));
            set.insert_value("$contact.last_name", html_escape(contact.last_name.trim()));
            set.insert_value(
                "$contact.email",
                non_empty(&contact.email).map(html_escape).unwrap_or_default(),
            );
            set.insert_value(
                "$contact.phone",
                non_empty(&contact.phone).map(html_escape).unwrap_or_default(),
            );
        }
        None => {
            for field in ["name", "first_name", "last_name", "email", "phone"] {
                set.insert_value(&format!("$contact.{}", field), "");
            }
            set.warn("$contact.name", "no recipient supplied");
        }
    }
}

fn line_item_rows(document: &Document, totals: &Totals, fmt: &Formatter<'_>) -> LineItemContext {
    let rows = document
        .line_items
        .iter()
        .zip(&totals.line_totals)
        .map(|(item, line_total)| {
            let taxes: Vec<TaxLine> = item
                .tax_rates
                .iter()
                .map(|rate| TaxLine {
                    name: rate.name.clone(),
                    rate: rate.rate,
                    amount: line_total.percent(rate.rate),
                })
                .collect();
            let tax_amount: Money = taxes.iter().map(|t| t.amount).sum();
            let discount = Money::from_decimal(item.discount);

            LineItemRow::new()
                .with("product_key", html_escape(item.product_key.trim()))
                .with("description", escape_multiline(&item.notes))
                .with("quantity", fmt.quantity(item.quantity))
                .with("cost", fmt.money(Money::from_decimal(item.cost)))
                .with(
                    "discount",
                    if discount.is_zero() {
                        String::new()
                    } else {
                        fmt.money(discount)
                    },
                )
                .with(
                    "tax",
                    taxes
                        .iter()
                        .map(|t| fmt.tax_label(t))
                        .collect::<Vec<_>>()
                        .join(", "),
                )
                .with(
                    "tax_amount",
                    if taxes.is_empty() {
                        String::new()
                    } else {
                        fmt.money(tax_amount)
                    },
                )
                .with("line_total", fmt.money(*line_total))
        })
        .collect();
    LineItemContext::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Company, Customer, CustomerSettings, LineItem};
    use pretty_assertions::assert_eq;

    fn catalog() -> LocaleCatalog {
        LocaleCatalog::embedded("en").unwrap()
    }

    fn document() -> Document {
        Document {
            number: "INV-0042".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 31),
            line_items: vec![
                LineItem {
                    product_key: "Design".to_string(),
                    notes: "Logo & branding".to_string(),
                    quantity: 2.0,
                    cost: 100.0,
                    tax_rates: vec![TaxRate {
                        name: "GST".to_string(),
                        rate: 10.0,
                    }],
                    ..LineItem::default()
                },
                LineItem {
                    product_key: "Hosting".to_string(),
                    quantity: 1.0,
                    cost: 50.0,
                    ..LineItem::default()
                },
            ],
            discount: 10.0,
            is_amount_discount: false,
            tax_rates: vec![TaxRate {
                name: "State".to_string(),
                rate: 5.0,
            }],
            customer: Customer {
                name: "Acme <Corp>".to_string(),
                email: Some("billing@acme.test".to_string()),
                ..Customer::default()
            },
            company: Company {
                name: "Widgets Ltd".to_string(),
                ..Company::default()
            },
            ..Document::default()
        }
    }

    #[test]
    fn computes_totals_in_cents() {
        let totals = Totals::compute(&document());
        assert_eq!(totals.subtotal, Money::from_cents(25_000));
        assert_eq!(totals.discount, Money::from_cents(2_500));
        assert_eq!(totals.line_taxes[0].amount, Money::from_cents(2_000));
        assert_eq!(totals.document_taxes[0].amount, Money::from_cents(1_125));
        assert_eq!(totals.total, Money::from_cents(25_625));
        assert_eq!(totals.balance, totals.total);
    }

    #[test]
    fn huge_line_totals_saturate_instead_of_overflowing() {
        let mut doc = document();
        for item in &mut doc.line_items {
            item.cost = 9.0e16;
            item.quantity = 1.0;
            item.discount = 0.0;
        }
        let totals = Totals::compute(&doc);
        assert_eq!(totals.subtotal, Money::from_cents(i64::MAX));
        assert_eq!(totals.total, Money::from_cents(i64::MAX));
    }

    #[test]
    fn same_tax_on_several_lines_is_grouped() {
        let mut doc = document();
        doc.line_items[1].tax_rates = doc.line_items[0].tax_rates.clone();
        let totals = Totals::compute(&doc);
        assert_eq!(totals.line_taxes.len(), 1);
        assert_eq!(totals.line_taxes[0].amount, Money::from_cents(2_500));
    }

    #[test]
    fn resolves_labels_and_values() {
        let catalog = catalog();
        let resolution = Resolver::new(&catalog).resolve(&document(), None);
        let set = &resolution.substitutions;

        assert_eq!(set.get("$balance_due_label"), Some("Balance Due"));
        assert_eq!(set.get("$entity_label"), Some("Invoice"));
        assert_eq!(set.get("$due_date_label"), Some("Due Date"));
        assert_eq!(set.get("$total"), Some("$256.25"));
        assert_eq!(set.get("$entity.amount"), Some("256.25"));
        assert_eq!(set.get("$date"), Some("Mar 1, 2024"));
        assert_eq!(set.get("$client.name"), Some("Acme &lt;Corp&gt;"));
        assert_eq!(set.get("$has_line_taxes"), Some("true"));
        assert_eq!(set.get("$line_tax_labels"), Some("<span>GST 10%</span>"));
    }

    #[test]
    fn entity_details_never_carry_the_balance() {
        let catalog = catalog();
        let resolution = Resolver::new(&catalog).resolve(&document(), None);
        let details = resolution.substitutions.get("$entity_details").unwrap();
        assert_eq!(
            details,
            "<span>INV-0042</span>\n<span>Mar 1, 2024</span>\n<span>Mar 31, 2024</span>"
        );
        assert!(!details.contains("256.25"));
    }

    #[test]
    fn quotes_use_valid_until() {
        let catalog = catalog();
        let mut doc = document();
        doc.kind = crate::document::DocumentKind::Quote;
        let resolution = Resolver::new(&catalog).resolve(&doc, None);
        assert_eq!(
            resolution.substitutions.get("$due_date_label"),
            Some("Valid Until")
        );
        assert_eq!(resolution.substitutions.get("$entity_label"), Some("Quote"));
    }

    #[test]
    fn line_rows_follow_document_order() {
        let catalog = catalog();
        let resolution = Resolver::new(&catalog).resolve(&document(), None);
        let rows = resolution.line_items.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("product_key"), Some("Design"));
        assert_eq!(rows[0].get("description"), Some("Logo &amp; branding"));
        assert_eq!(rows[0].get("line_total"), Some("$200.00"));
        assert_eq!(rows[0].get("tax_amount"), Some("$20.00"));
        assert_eq!(rows[1].get("product_key"), Some("Hosting"));
        assert_eq!(rows[1].get("tax"), Some(""));
    }

    #[test]
    fn uses_customer_locale_and_currency() {
        let catalog = catalog();
        let mut doc = document();
        doc.customer.settings = CustomerSettings {
            locale: Some("de".to_string()),
            currency: Some("EUR".to_string()),
        };
        let resolution = Resolver::new(&catalog).resolve(&doc, None);
        assert_eq!(resolution.substitutions.locale(), "de");
        assert_eq!(resolution.substitutions.get("$total"), Some("256,25 €"));
    }

    #[test]
    fn missing_data_is_reported_as_warnings() {
        let catalog = catalog();
        let mut doc = document();
        doc.date = None;
        doc.customer.email = None;
        doc.customer.settings.locale = Some("xx".to_string());
        doc.customer.settings.currency = Some("XYZ".to_string());

        let resolution = Resolver::new(&catalog).resolve(&doc, None);
        let set = &resolution.substitutions;
        let flagged: Vec<&str> = set
            .warnings()
            .iter()
            .map(|w| w.placeholder.as_str())
            .collect();

        for expected in ["$locale", "$currency_code", "$date", "$client.email", "$contact.name"] {
            assert!(flagged.contains(&expected), "missing warning for {}", expected);
        }
        assert_eq!(set.get("$date"), Some(""));
        assert_eq!(set.get("$total"), Some("XYZ256.25"));
    }

    #[test]
    fn missing_translation_falls_back_to_key() {
        let catalog = catalog();
        let locale = catalog.locale(Some("en"));
        let mut set = SubstitutionSet::new("en");
        assert_eq!(translate(&mut set, &locale, "no_such_key"), "no_such_key");
        assert_eq!(set.warnings()[0].placeholder, "$no_such_key_label");
    }

    #[test]
    fn recipient_fills_contact_fields() {
        let catalog = catalog();
        let contact = Contact {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: Some("ada@acme.test".to_string()),
            phone: None,
        };
        let resolution = Resolver::new(&catalog).resolve(&document(), Some(&contact));
        let set = &resolution.substitutions;
        assert_eq!(set.get("$contact.name"), Some("Ada Lovelace"));
        assert_eq!(set.get("$contact.email"), Some("ada@acme.test"));
        assert!(set.warnings().iter().all(|w| w.placeholder != "$contact.name"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog);
        let a = resolver.resolve(&document(), None);
        let b = resolver.resolve(&document(), None);
        assert_eq!(a.substitutions, b.substitutions);
        assert_eq!(a.line_items, b.line_items);
    }
}
