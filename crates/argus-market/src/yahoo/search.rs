use crate::frame::{Frame, RowKey};
use crate::reply::Reply;
use crate::value::Scalar;
use anyhow::Result;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, trace};

// News headlines ride along with Yahoo's search endpoint.

const NEWS_COUNT: &str = "20";

pub(crate) async fn news(client: &Client, symbol: &str) -> Result<Reply> {
    let url = "https://query2.finance.yahoo.com/v1/finance/search";
    trace!("Fetching news for [{symbol}] from Yahoo Finance");
    let response: SearchResponse = client
        .get(url)
        .query(&[("q", symbol), ("quotesCount", "0"), ("newsCount", NEWS_COUNT)])
        .send()
        .await
        .map_err(|e| {
            error!("[{symbol}] news fetching error: {e}");
            e
        })?
        .json()
        .await
        .map_err(|e| {
            error!("[{symbol}] news deserialization error: {e}");
            e
        })?;
    Ok(response.into_reply())
}

impl SearchResponse {
    pub(crate) fn into_reply(self) -> Reply {
        let Some(items) = self.news else {
            return Reply::Missing;
        };
        let mut frame = Frame::new(["title", "publisher", "link", "publishedAt", "type"]);
        for (i, item) in items.into_iter().enumerate() {
            frame.push_row(
                RowKey::Position(i),
                vec![
                    item.title.into(),
                    item.publisher.map(Scalar::Text).unwrap_or(Scalar::Null),
                    item.link.map(Scalar::Text).unwrap_or(Scalar::Null),
                    item.provider_publish_time
                        .and_then(|ts| DateTime::from_timestamp(ts, 0))
                        .map(Scalar::Time)
                        .unwrap_or(Scalar::Null),
                    item.kind.map(Scalar::Text).unwrap_or(Scalar::Null),
                ],
            );
        }
        Reply::Table(frame)
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct SearchResponse {
    pub news: Option<Vec<NewsItem>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewsItem {
    pub title: String,
    pub publisher: Option<String>,
    pub link: Option<String>,
    pub provider_publish_time: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}
