use crate::{
  config::RelayConfig,
  error::{DoorError, DoorResult},
};

/// Number of channels on the relay board.
pub const RELAY_CHANNELS: usize = 4;

/// Channel values sit at fixed positions after the status and count tokens.
const LOAD_CHANNELS_OFFSET: usize = 2;
/// Position of the observed post-write channel value in a write response.
const WRITE_ACK_OFFSET: usize = 4;

/// Client for the relay board's CGI endpoints.
///
/// The board answers every request with `&`-joined tokens; the first token is
/// a status code where "0" means ok. Anything else is fatal for that request,
/// never silently treated as "all channels off".
#[derive(Debug, Clone)]
pub struct RelayClient {
  client: reqwest::Client,
  host: String,
}

impl RelayClient {
  pub fn with_config(config: RelayConfig) -> DoorResult<RelayClient> {
    let client = reqwest::Client::builder().timeout(config.timeout).build()?;

    Ok(RelayClient {
      client,
      host: config.host,
    })
  }

  /// Read the current state of all relay channels.
  pub async fn query_channels(&self) -> DoorResult<[u8; RELAY_CHANNELS]> {
    let url = format!("{}/relay_cgi_load.cgi", self.host);
    let body = self.client.get(&url).send().await?.text().await?;

    parse_channel_states(&body)
  }

  /// Energize or release a single relay channel and return its observed
  /// post-write state.
  ///
  /// An error means the actuation is unverified, not that the channel is off.
  pub async fn set_channel(&self, channel: u8, on: bool) -> DoorResult<bool> {
    let url = format!(
      "{}/relay_cgi.cgi?type=0&relay={}&on={}&time=0&pwd=&",
      self.host,
      channel,
      if on { 1 } else { 0 }
    );
    let body = self.client.get(&url).send().await?.text().await?;

    parse_write_ack(&body)
  }
}

/// Split a response body into its `&`-joined tokens.
///
/// The board prefixes its responses with a separator; a single leading `&` is
/// stripped before splitting.
fn tokenize(body: &str) -> DoorResult<Vec<&str>> {
  if body.trim().is_empty() {
    return Err(DoorError::Protocol("empty response".to_owned()));
  }

  let body = body.strip_prefix('&').unwrap_or(body);
  Ok(body.split('&').collect())
}

fn check_status(tokens: &[&str]) -> DoorResult<()> {
  // split always yields at least one token
  let status = tokens[0];
  if status != "0" {
    return Err(DoorError::Protocol(format!("relay status {status:?}")));
  }

  Ok(())
}

fn channel_value(tokens: &[&str], position: usize) -> DoorResult<u8> {
  let token = tokens
    .get(position)
    .ok_or_else(|| DoorError::Protocol(format!("missing token at position {position}")))?;

  token
    .parse()
    .map_err(|_| DoorError::Protocol(format!("non-numeric channel value {token:?}")))
}

fn parse_channel_states(body: &str) -> DoorResult<[u8; RELAY_CHANNELS]> {
  let tokens = tokenize(body)?;
  check_status(&tokens)?;

  let mut channels = [0; RELAY_CHANNELS];
  for (index, channel) in channels.iter_mut().enumerate() {
    *channel = channel_value(&tokens, LOAD_CHANNELS_OFFSET + index)?;
  }

  Ok(channels)
}

fn parse_write_ack(body: &str) -> DoorResult<bool> {
  let tokens = tokenize(body)?;
  check_status(&tokens)?;

  Ok(channel_value(&tokens, WRITE_ACK_OFFSET)? != 0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn load_response_parses_channel_states() {
    assert_eq!(parse_channel_states("&0&4&0&1&0&1&").unwrap(), [0, 1, 0, 1]);
  }

  #[test]
  fn load_response_without_leading_separator_parses() {
    assert_eq!(parse_channel_states("0&4&1&1&1&1").unwrap(), [1, 1, 1, 1]);
  }

  #[test]
  fn blank_response_is_a_protocol_error() {
    assert!(matches!(parse_channel_states(""), Err(DoorError::Protocol(_))));
    assert!(matches!(parse_channel_states("  \n"), Err(DoorError::Protocol(_))));
  }

  #[test]
  fn non_zero_status_is_fatal() {
    assert!(matches!(parse_channel_states("&1&4&0&0&0&0&"), Err(DoorError::Protocol(_))));
  }

  #[test]
  fn short_response_is_a_protocol_error() {
    assert!(matches!(parse_channel_states("&0&4&0&0"), Err(DoorError::Protocol(_))));
  }

  #[test]
  fn non_numeric_channel_is_a_protocol_error() {
    assert!(matches!(parse_channel_states("&0&4&0&x&0&0&"), Err(DoorError::Protocol(_))));
  }

  #[test]
  fn write_ack_reports_observed_state() {
    assert!(parse_write_ack("&0&0&2&1&1&").unwrap());
    assert!(!parse_write_ack("&0&0&2&0&0&").unwrap());
  }

  #[test]
  fn write_ack_checks_status() {
    assert!(matches!(parse_write_ack("&5&0&2&1&1&"), Err(DoorError::Protocol(_))));
  }
}
