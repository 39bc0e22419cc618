/// Test fixtures: representative payloads from both data sources.
///
/// The spreadsheet fixtures mirror the CSV export of the per-region case
/// table:
///   Province/State, Country/Region, Last Update, Confirmed, Deaths, Recovered
///
/// Notes on the real feed:
///   - Province is empty for countries reported as a whole.
///   - Numeric cells are frequently blank rather than `0`.
///   - Timestamps use `M/D/YYYY H:MM` without a timezone.
///
/// The scraped fixtures are trimmed news pages. The figure lives in the
/// first `<strong>` of a paragraph inside `<div id="mvp-content-main">`.

/// Header plus one country-level row.
#[cfg(test)]
pub(crate) fn fixture_single_row_csv() -> &'static str {
    "Province,Country,Last Update,Confirmed,Deaths,Recovered\n,Italy,1/22/2020 17:00,2,0,0\n"
}

/// Early-outbreak table with blank numeric cells and mixed province usage.
#[cfg(test)]
pub(crate) fn fixture_early_outbreak_csv() -> &'static str {
    "Province/State,Country/Region,Last Update,Confirmed,Deaths,Recovered\n\
     Hubei,Mainland China,1/26/2020 11:00,1058,52,42\n\
     Guangdong,Mainland China,1/26/2020 11:00,111,,2\n\
     ,Thailand,1/26/2020 11:00,5,,\n\
     Washington,US,1/26/2020 11:00,1,,\n"
}

/// Header only: a valid but empty table.
#[cfg(test)]
pub(crate) fn fixture_header_only_csv() -> &'static str {
    "Province/State,Country/Region,Last Update,Confirmed,Deaths,Recovered\n"
}

/// News page with the landmark in place.
#[cfg(test)]
pub(crate) fn fixture_news_page_html() -> &'static str {
    r#"<!DOCTYPE html>
<html>
  <head><title>The latest coronavirus cases</title></head>
  <body>
    <div id="mvp-side-wrap"><p><strong>Subscribe</strong> for updates.</p></div>
    <div id="mvp-content-main">
      <p><em>Updated hourly.</em></p>
      <p><strong>There are currently 1,200 confirmed cases worldwide, including 34 fatalities.</strong> Totals include mainland China.</p>
      <p><strong>There are currently 9 confirmed cases worldwide, including 9 fatalities.</strong></p>
    </div>
  </body>
</html>"#
}

/// Same sentence outside the landmark container: must not be picked up.
#[cfg(test)]
pub(crate) fn fixture_news_page_without_landmark_html() -> &'static str {
    r#"<html>
  <body>
    <div id="sidebar">
      <p><strong>There are currently 5 confirmed cases worldwide, including 1 fatalities.</strong></p>
    </div>
    <div id="mvp-content-main">
      <p>No figures today.</p>
    </div>
  </body>
</html>"#
}

/// Landmark nested a few levels deep, with large separated figures.
#[cfg(test)]
pub(crate) fn fixture_nested_landmark_html() -> &'static str {
    r#"<html>
  <body>
    <main>
      <article>
        <div class="wrapper">
          <div id="mvp-content-main">
            <section>
              <p><b>There are currently 1,234,567 confirmed cases worldwide, including 67,890 fatalities.</b></p>
            </section>
          </div>
        </div>
      </article>
    </main>
  </body>
</html>"#
}
