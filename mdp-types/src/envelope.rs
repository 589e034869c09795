//! A stable tag-length-value binary encoding of a [`Request`](crate::Request).
//!
//! The wire protocol a client speaks to reach this provider is an external
//! collaborator, handled elsewhere — this module is the provider's own
//! *internal* envelope between a client session and the worker pool that
//! serves it.

use std::io::{Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{Error, ModelType, Request, RequestKind, RequestToken};

const TAG_KIND: u8 = 1;
const TAG_REQUEST_TOKEN: u8 = 2;
const TAG_SERVICE_ID: u8 = 3;
const TAG_MODEL_TYPE: u8 = 4;
const TAG_ITEM_NAME: u8 = 5;
const TAG_WIRE_MAJOR: u8 = 6;
const TAG_WIRE_MINOR: u8 = 7;

const KIND_SNAPSHOT: u8 = 0;
const KIND_ABORT: u8 = 1;

fn write_tlv(out: &mut Vec<u8>, tag: u8, value: &[u8]) {
    out.push(tag);
    out.write_u16::<BigEndian>(value.len() as u16).unwrap();
    out.extend_from_slice(value);
}

/// Encode a [`Request`] into its TLV envelope.
pub fn encode(request: &Request) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + request.item_name.len());

    let kind_byte = match request.kind {
        RequestKind::Snapshot => KIND_SNAPSHOT,
        RequestKind::Abort => KIND_ABORT,
    };
    write_tlv(&mut out, TAG_KIND, &[kind_byte]);

    if matches!(request.kind, RequestKind::Abort) {
        return out;
    }

    write_tlv(&mut out, TAG_REQUEST_TOKEN, &request.request_token.0.to_be_bytes());
    write_tlv(&mut out, TAG_SERVICE_ID, &request.service_id.to_be_bytes());
    write_tlv(
        &mut out,
        TAG_MODEL_TYPE,
        &request.model_type.discriminant().to_be_bytes(),
    );
    write_tlv(&mut out, TAG_ITEM_NAME, request.item_name.as_bytes());
    write_tlv(&mut out, TAG_WIRE_MAJOR, &[request.wire_major]);
    write_tlv(&mut out, TAG_WIRE_MINOR, &[request.wire_minor]);

    out
}

/// Decode a [`Request`] from its TLV envelope, as produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Request, Error> {
    let mut cursor = Cursor::new(bytes);

    let mut kind: Option<RequestKind> = None;
    let mut request_token: Option<RequestToken> = None;
    let mut service_id: Option<u32> = None;
    let mut model_type: Option<ModelType> = None;
    let mut item_name: Option<String> = None;
    let mut wire_major: Option<u8> = None;
    let mut wire_minor: Option<u8> = None;

    loop {
        let tag = match cursor.read_u8() {
            Ok(t) => t,
            Err(_) => break,
        };
        let len = cursor
            .read_u16::<BigEndian>()
            .map_err(|_| Error::EnvelopeTruncated { tag })? as usize;
        let mut buf = vec![0u8; len];
        cursor
            .read_exact(&mut buf)
            .map_err(|_| Error::EnvelopeTruncated { tag })?;

        match tag {
            TAG_KIND => {
                kind = Some(match buf.first() {
                    Some(&KIND_SNAPSHOT) => RequestKind::Snapshot,
                    Some(&KIND_ABORT) => RequestKind::Abort,
                    _ => return Err(Error::EnvelopeTruncated { tag }),
                });
            }
            TAG_REQUEST_TOKEN => {
                request_token = Some(RequestToken(read_be_u64(&buf, tag)?));
            }
            TAG_SERVICE_ID => {
                service_id = Some(read_be_u32(&buf, tag)?);
            }
            TAG_MODEL_TYPE => {
                model_type = Some(ModelType::from_discriminant(read_be_u16(&buf, tag)?));
            }
            TAG_ITEM_NAME => {
                item_name = Some(
                    String::from_utf8(buf)
                        .map_err(|_| Error::EnvelopeInvalidUtf8 { field: "item_name" })?,
                );
            }
            TAG_WIRE_MAJOR => {
                wire_major = buf.first().copied();
            }
            TAG_WIRE_MINOR => {
                wire_minor = buf.first().copied();
            }
            other => return Err(Error::EnvelopeUnknownTag(other)),
        }
    }

    let kind = kind.ok_or(Error::EnvelopeMissingField("kind"))?;
    if matches!(kind, RequestKind::Abort) {
        return Ok(Request::abort());
    }

    Ok(Request {
        kind,
        request_token: request_token.ok_or(Error::EnvelopeMissingField("request_token"))?,
        service_id: service_id.ok_or(Error::EnvelopeMissingField("service_id"))?,
        model_type: model_type.ok_or(Error::EnvelopeMissingField("model_type"))?,
        item_name: item_name.ok_or(Error::EnvelopeMissingField("item_name"))?,
        wire_major: wire_major.ok_or(Error::EnvelopeMissingField("wire_major"))?,
        wire_minor: wire_minor.ok_or(Error::EnvelopeMissingField("wire_minor"))?,
    })
}

fn read_be_u64(buf: &[u8], tag: u8) -> Result<u64, Error> {
    buf.try_into()
        .map(u64::from_be_bytes)
        .map_err(|_| Error::EnvelopeTruncated { tag })
}

fn read_be_u32(buf: &[u8], tag: u8) -> Result<u32, Error> {
    buf.try_into()
        .map(u32::from_be_bytes)
        .map_err(|_| Error::EnvelopeTruncated { tag })
}

fn read_be_u16(buf: &[u8], tag: u8) -> Result<u16, Error> {
    buf.try_into()
        .map(u16::from_be_bytes)
        .map_err(|_| Error::EnvelopeTruncated { tag })
}
