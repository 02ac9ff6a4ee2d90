//! Where things are on the booking site's pages.
//!
//! Every selector the search session relies on lives here, so a change to
//! the site's markup only touches this file.

use crate::browser::Locator;
use crate::domain::FareClass;

/// Locators for the search form, outcome banners and result rows.
#[derive(Debug, Clone)]
pub struct PageLocators {
    // Search form
    pub new_search_button: Locator,
    pub from_field: Locator,
    pub from_input: Locator,
    pub from_confirmation: Locator,
    pub to_field: Locator,
    pub to_input: Locator,
    pub to_confirmation: Locator,
    pub departs_field: Locator,
    pub date_input: Locator,
    /// Only matches once the button is enabled.
    pub search_button: Locator,
    pub form_body: Locator,

    // Outcome
    pub no_service_banner: Locator,
    pub no_trips_dialog: Locator,
    /// Inside `no_trips_dialog`.
    pub no_trips_message: Locator,
    pub results_container: Locator,

    // Inside `results_container`
    pub result_row: Locator,
    pub pager: Locator,
    /// Inside `pager`, one per page number.
    pub page_item: Locator,

    // Inside a result row
    pub row_leg: Locator,
    pub train_name: Locator,
    pub departure_block: Locator,
    pub arrival_block: Locator,
    /// Inside a departure or arrival block.
    pub clock_time: Locator,
    pub delay_notice: Locator,
    pub travel_time_block: Locator,
    pub travel_time: Locator,
    pub segment_label: Locator,
    pub next_day: Locator,
    pub price_area: Locator,
    pub price_amount: Locator,
}

impl Default for PageLocators {
    fn default() -> Self {
        let x = Locator::xpath;
        Self {
            new_search_button: x("//button[@class='am-btn btn--secondary btn--transparent-blue-border']"),
            from_field: x("//station-search[@amt-auto-test-id='fare-finder-from-station-field-page']"),
            from_input: x("//input[@id='mat-input-0']"),
            from_confirmation: x("//button[contains(@aria-label,'From')]"),
            to_field: x("//station-search[@amt-auto-test-id='fare-finder-to-station-field-page']"),
            to_input: x("//input[@id='mat-input-1']"),
            to_confirmation: x("//button[contains(@aria-label,'To')]"),
            departs_field: x("//div[@class='departs-container w-100']"),
            date_input: x("//input[@id='mat-input-2']"),
            search_button: x("//button[@class='search-btn ng-star-inserted' and @aria-disabled='false']"),
            form_body: x("//div[@class='amtrak-ff-body']"),

            no_service_banner: x("//div[@class='alert-yellow-text']"),
            no_trips_dialog: x("//div[@amt-auto-test-id='am-dialog']"),
            no_trips_message: x(".//div[@class='pb-0 mb-5 ng-star-inserted']"),
            results_container: x("//div[@class='row ng-tns-c6-1 ng-trigger ng-trigger-searchList ng-star-inserted']"),

            result_row: x(".//div[@class='col-sm-6 col-lg-12 ng-tns-c6-1 ng-trigger ng-trigger-searchItems ng-star-inserted']"),
            pager: x(".//ul[@class='pagination paginator__pagination ng-tns-c6-1']"),
            page_item: x(".//li[contains(@class,'pagination-page')]"),

            row_leg: x(".//div[@class='search-results-leg d-flex']"),
            train_name: x(".//div[@amt-auto-test-id='search-result-train-name']"),
            departure_block: x(".//div[@class='departure-inner']"),
            arrival_block: x(".//div[@class='arrival-inner']"),
            clock_time: x(".//div[@class='time mt-2 pt-1 d-flex align-items-baseline']"),
            delay_notice: x(".//div[@class='delay-alerts']//span[@class='ng-star-inserted']"),
            travel_time_block: x(".//div[@class='travel-time d-flex flex-grow-1']"),
            travel_time: x(".//span[@class='text-center']"),
            segment_label: x(".//span[@class='segment-display text-center font-semi mt-2 d-block ng-star-inserted']"),
            next_day: x(".//div[@class='travel-next-day']"),
            price_area: x(".//div[@class='row col-12 p-0 m-0']"),
            price_amount: x(".//span[@class='amount ng-star-inserted']"),
        }
    }
}

impl PageLocators {
    /// The pager link for page `n`, inside `pager`.
    pub fn page_link(&self, n: usize) -> Locator {
        Locator::xpath(format!(".//*[text()='{n}']"))
    }

    /// Matches once page `n` is the active page.
    pub fn active_page(&self, n: usize) -> Locator {
        Locator::xpath(format!(
            "//a[text()='{n}']//ancestor::li[@class='pagination-page page-item active ng-star-inserted']"
        ))
    }

    /// The fare button for one class, inside `price_area`.
    pub fn price_button(&self, class: FareClass) -> Locator {
        Locator::xpath(format!(
            ".//button[@amt-test-id='jl-0-op-0-{}']",
            class.as_str()
        ))
    }
}
