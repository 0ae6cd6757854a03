//! Ordinals envelope parsing: a push of the ASCII
//! bytes `ord`, followed by a content-type push, optional separators,
//! and one or more payload pushes concatenated in order.

use bitcoin_utils::script::scan_script;

const OP_ENDIF: u8 = 0x68;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrdEnvelope {
    pub content_type: String,
    pub payload: Vec<u8>,
}

/// Walks `bytes` as a script and extracts every Ordinal envelope it
/// contains, in order. Tolerant of separator tag bytes between the
/// content-type push and the payload pushes, since those are bare
/// (zero-length) items under [`scan_script`]'s pushdata grammar.
pub fn parse_ord_envelopes(bytes: &[u8]) -> Vec<OrdEnvelope> {
    let items = scan_script(bytes);
    let mut envelopes = Vec::new();
    let mut i = 0;

    while i < items.len() {
        if items[i].data != b"ord" {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        // Skip bare separator/tag items (empty data) before the
        // content-type push.
        while j < items.len() && items[j].data.is_empty() && items[j].opcode != OP_ENDIF {
            j += 1;
        }
        let Some(content_type_item) = items.get(j) else {
            break;
        };
        let content_type = String::from_utf8_lossy(&content_type_item.data).to_string();
        j += 1;

        let mut payload = Vec::new();
        while j < items.len() {
            if items[j].opcode == OP_ENDIF {
                j += 1;
                break;
            }
            if items[j].data == b"ord" {
                // Next envelope begins; this one ends here without an
                // explicit OP_ENDIF (tolerant of malformed scripts).
                break;
            }
            payload.extend_from_slice(&items[j].data);
            j += 1;
        }

        envelopes.push(OrdEnvelope { content_type, payload });
        i = j.max(i + 1);
    }

    envelopes
}
