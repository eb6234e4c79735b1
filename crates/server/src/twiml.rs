//! Call-control document
//!
//! Answers the telephony provider's incoming-call webhook with a document
//! that opens a media stream back to this server, then speaks the greeting.

use std::borrow::Cow;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use voice_gateway_config::ServerConfig;

use crate::ServerError;

type WriteResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Render the document for `server`
pub fn render(server: &ServerConfig) -> Result<String, ServerError> {
    write_document(server).map_err(|e| ServerError::Document(e.to_string()))
}

fn write_document(server: &ServerConfig) -> WriteResult<String> {
    let resolved = server.resolved_stream_url();
    let stream_url = with_token(&resolved, &server.stream_token);

    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("Response")))?;

    // Stream first so no caller audio is missed during the greeting
    writer.write_event(Event::Start(BytesStart::new("Start")))?;
    let stream = BytesStart::new("Stream").with_attributes([
        ("url", stream_url.as_ref()),
        ("name", server.stream_name.as_str()),
    ]);
    writer.write_event(Event::Start(stream))?;
    if !server.stream_token.is_empty() {
        let parameter = BytesStart::new("Parameter")
            .with_attributes([("name", "token"), ("value", server.stream_token.as_str())]);
        writer.write_event(Event::Empty(parameter))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Stream")))?;
    writer.write_event(Event::End(BytesEnd::new("Start")))?;

    if !server.greeting.trim().is_empty() {
        let say = BytesStart::new("Say").with_attributes([("voice", "Polly.Joanna")]);
        writer.write_event(Event::Start(say))?;
        writer.write_event(Event::Text(BytesText::new(&server.greeting)))?;
        writer.write_event(Event::End(BytesEnd::new("Say")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Response")))?;
    Ok(String::from_utf8(writer.into_inner())?)
}

/// Append `token=<value>` to the stream URL's query
fn with_token<'a>(url: &'a str, token: &str) -> Cow<'a, str> {
    if token.is_empty() {
        return Cow::Borrowed(url);
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    Cow::Owned(format!("{url}{separator}token={}", urlencoding::encode(token)))
}
