//! Reading one visible result row.

use crate::browser::{BrowserDriver, DriverError, ElementRef, Locator};
use crate::domain::FareClass;
use crate::parser::ScrapedRow;

use super::PageLocators;

/// Collect the text of a result row's fields.
///
/// Returns `Ok(None)` when the row has no journey body (ads, spacers).
/// Missing fields are left as `None` for the parser to judge.
pub async fn scrape_row<D: BrowserDriver + ?Sized>(
    driver: &mut D,
    row: &ElementRef,
    loc: &PageLocators,
) -> Result<Option<ScrapedRow>, DriverError> {
    let Some(body) = driver.find(Some(row), &loc.row_leg).await? else {
        return Ok(None);
    };

    let train_label = text_in(driver, &body, &loc.train_name).await?;

    let (departure_time, delay_notice) = match driver.find(Some(&body), &loc.departure_block).await? {
        Some(block) => (
            text_in(driver, &block, &loc.clock_time)
                .await?
                .map(|t| t.replace('\n', "")),
            text_in(driver, &block, &loc.delay_notice).await?,
        ),
        None => (None, None),
    };

    let (travel_time, segment_label) = match driver.find(Some(&body), &loc.travel_time_block).await? {
        Some(block) => {
            let label = text_in(driver, &block, &loc.segment_label).await?;
            let time = match text_in(driver, &block, &loc.travel_time).await? {
                Some(t) => Some(t),
                None => duration_from_block(&driver.text(&block).await?),
            };
            (time, label)
        }
        None => (None, None),
    };

    let (arrival_time, arrival_day) = match driver.find(Some(&body), &loc.arrival_block).await? {
        Some(block) => (
            text_in(driver, &block, &loc.clock_time)
                .await?
                .map(|t| t.replace('\n', "")),
            text_in(driver, &block, &loc.next_day).await?,
        ),
        None => (None, None),
    };

    let mut prices = [None, None, None];
    if let Some(area) = driver.find(Some(&body), &loc.price_area).await? {
        for (slot, class) in prices.iter_mut().zip(FareClass::ALL) {
            if let Some(button) = driver.find(Some(&area), &loc.price_button(class)).await? {
                *slot = text_in(driver, &button, &loc.price_amount).await?;
            }
        }
    }
    let [coach, business, sleeper] = prices;

    Ok(Some(ScrapedRow {
        train_label,
        departure_time,
        delay_notice,
        travel_time,
        segment_label,
        arrival_time,
        arrival_day,
        coach,
        business,
        sleeper,
    }))
}

async fn text_in<D: BrowserDriver + ?Sized>(
    driver: &mut D,
    scope: &ElementRef,
    locator: &Locator,
) -> Result<Option<String>, DriverError> {
    match driver.find(Some(scope), locator).await? {
        Some(element) => Ok(Some(driver.text(&element).await?)),
        None => Ok(None),
    }
}

/// The travel-time block sometimes carries a notice line before the duration.
fn duration_from_block(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines
        .get(1)
        .or_else(|| lines.first())
        .map(|l| l.trim().to_string())
}
