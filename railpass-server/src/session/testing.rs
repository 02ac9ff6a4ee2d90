//! A scripted copy of the booking site for session tests.

use chrono::NaiveDate;

use crate::browser::{FixtureNode, FixturePage, FixtureScript, Locator};
use crate::domain::FareClass;
use crate::domain::testing::code;

use super::{PageLocators, SearchRequest, SessionConfig};

pub const SEARCH_URL: &str = "https://rail.test/search";

pub fn config() -> SessionConfig {
    SessionConfig::default().with_search_url(SEARCH_URL)
}

pub fn request() -> SearchRequest {
    SearchRequest::new(
        code("WAS"),
        code("NYP"),
        NaiveDate::from_ymd_opt(2024, 3, 29).unwrap(),
    )
}

fn node(locator: &Locator) -> FixtureNode {
    FixtureNode::new(locator.clone())
}

/// The search form, minus any element whose locator is in `missing`.
pub fn form_page(loc: &PageLocators, missing: &[&Locator]) -> FixturePage {
    let elements = [
        node(&loc.new_search_button),
        node(&loc.from_field),
        node(&loc.from_input),
        node(&loc.from_confirmation),
        node(&loc.to_field),
        node(&loc.to_input),
        node(&loc.to_confirmation),
        node(&loc.departs_field),
        node(&loc.date_input),
        node(&loc.search_button).leads_to("results"),
        node(&loc.form_body),
    ];
    elements
        .into_iter()
        .filter(|n| !missing.contains(&&n.locator))
        .fold(FixturePage::new(), FixturePage::element)
}

/// A result page: the "new search" control plus whatever the outcome shows.
pub fn outcome_page(loc: &PageLocators) -> FixturePage {
    FixturePage::new().element(node(&loc.new_search_button).leads_to("form"))
}

/// The whole site, with `results` shown after submitting.
pub fn site(loc: &PageLocators, results: FixturePage) -> FixtureScript {
    FixtureScript::new()
        .landing(SEARCH_URL, "form")
        .page("form", form_page(loc, &[]))
        .page("results", results)
}

/// A visible result row with a coach fare.
pub fn result_row(
    loc: &PageLocators,
    label: &str,
    departs: &str,
    arrives: &str,
    coach: &str,
) -> FixtureNode {
    let text = |locator: &Locator, text: &str| node(locator).with_text(text);
    node(&loc.result_row).child(
        node(&loc.row_leg)
            .child(text(&loc.train_name, label))
            .child(node(&loc.departure_block).child(text(&loc.clock_time, departs)))
            .child(node(&loc.travel_time_block).child(text(&loc.travel_time, "3h 25m")))
            .child(node(&loc.arrival_block).child(text(&loc.clock_time, arrives)))
            .child(
                node(&loc.price_area).child(
                    node(&loc.price_button(FareClass::Coach))
                        .child(text(&loc.price_amount, coach)),
                ),
            ),
    )
}

/// The pager, with one link per page leading to page `p{n}`.
pub fn pager(loc: &PageLocators, pages: usize) -> FixtureNode {
    (1..=pages).fold(node(&loc.pager), |pager, n| {
        pager.child(
            node(&loc.page_item).child(
                node(&loc.page_link(n))
                    .with_text(n.to_string())
                    .leads_to(format!("p{n}")),
            ),
        )
    })
}

/// A structured record with one direct train.
pub fn stored_record(train: &str) -> String {
    format!(
        r#"{{"journeyOptions":[{{
            "id":"{train}",
            "origin":"WAS","destination":"NYP",
            "departureDateTime":"2024-03-29T07:05:00",
            "arrivalDateTime":"2024-03-29T10:30:00",
            "elapsedTime":"3h 25m",
            "travelLegs":[{{"serviceNumber":"{train}","serviceName":"Acela","serviceType":"TRAIN"}}],
            "fares":[{{"fareClass":"BUSINESS","amount":129.0}}]
        }}]}}"#
    )
}
