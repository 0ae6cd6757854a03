//! Per-transaction and per-block extraction driver: walks
//! witness stacks, scriptSigs, and OP_RETURN outputs in the order the
//! spec prescribes, sanitizes and dedups the result.

use std::collections::HashSet;

use starlight_types::inscription::InscriptionOrigin;
use starlight_types::{ExtractedInscription, Transaction};

use crate::envelope::parse_ord_envelopes;
use crate::format::{extension_for_format, format_tag_for_content_type};
use crate::image_sig::starts_with_image_signature;
use crate::sanitize::sanitize_payload;

const OP_RETURN: u8 = 0x6a;

fn is_op_return(script_pubkey: &[u8]) -> bool {
    script_pubkey.first() == Some(&OP_RETURN)
}

fn txid_prefix16(tx: &Transaction) -> String {
    tx.txid_hex().chars().take(16).collect()
}

fn file_name_for(tx: &Transaction, origin: InscriptionOrigin, ext: &str) -> String {
    let prefix = txid_prefix16(tx);
    match origin {
        InscriptionOrigin::Witness { input, item, envelope } => {
            format!("{prefix}_in{input}_w{item}_i{envelope}.{ext}")
        }
        InscriptionOrigin::ScriptSig { input } => format!("{prefix}_input_{input}.{ext}"),
        InscriptionOrigin::OpReturn { output, push } => format!("{prefix}_opret_{output}_{push}.{ext}"),
        InscriptionOrigin::LegacyImage { item } => format!("{prefix}_img_{item}.{ext}"),
    }
}

fn build_inscription(
    tx: &Transaction,
    origin: InscriptionOrigin,
    content_type: &str,
    raw_payload: Vec<u8>,
) -> ExtractedInscription {
    let payload = sanitize_payload(content_type, &raw_payload);
    let format = format_tag_for_content_type(content_type).to_string();
    let ext = extension_for_format(&format);
    let file_name = file_name_for(tx, origin, ext);
    let size_bytes = payload.len();

    ExtractedInscription {
        txid: tx.txid,
        origin,
        content_type: content_type.to_string(),
        payload,
        format,
        size_bytes,
        file_name: file_name.clone(),
        file_path: format!("images/{file_name}"),
    }
}

/// Extracts every inscription from a single transaction, in order:
/// witness envelopes, then raw image signatures in
/// witness items without an envelope, then scriptSig envelopes, then
/// OP_RETURN pushes.
pub fn extract_tx_inscriptions(tx: &Transaction) -> Vec<ExtractedInscription> {
    let mut out = Vec::new();

    for (input_idx, stack) in tx.witnesses.iter().enumerate() {
        for (item_idx, item) in stack.iter().enumerate() {
            let envelopes = parse_ord_envelopes(item);
            if !envelopes.is_empty() {
                for (envelope_idx, envelope) in envelopes.into_iter().enumerate() {
                    out.push(build_inscription(
                        tx,
                        InscriptionOrigin::Witness { input: input_idx, item: item_idx, envelope: envelope_idx },
                        &envelope.content_type,
                        envelope.payload,
                    ));
                }
            } else if let Some(format) = starts_with_image_signature(item) {
                out.push(build_inscription(
                    tx,
                    InscriptionOrigin::LegacyImage { item: item_idx },
                    format.mime,
                    item.clone(),
                ));
            }
        }
    }

    for (input_idx, input) in tx.inputs.iter().enumerate() {
        for envelope in parse_ord_envelopes(&input.script_sig) {
            out.push(build_inscription(
                tx,
                InscriptionOrigin::ScriptSig { input: input_idx },
                &envelope.content_type,
                envelope.payload,
            ));
        }
    }

    for (out_idx, output) in tx.outputs.iter().enumerate() {
        if !is_op_return(&output.script_pubkey) {
            continue;
        }
        let items = bitcoin_utils::script::scan_script(&output.script_pubkey);
        for (push_idx, item) in items.iter().enumerate() {
            if item.data.is_empty() {
                continue;
            }
            let envelopes = parse_ord_envelopes(&item.data);
            if !envelopes.is_empty() {
                for envelope in envelopes {
                    out.push(build_inscription(
                        tx,
                        InscriptionOrigin::OpReturn { output: out_idx, push: push_idx },
                        &envelope.content_type,
                        envelope.payload,
                    ));
                }
            } else if let Some(format) = starts_with_image_signature(&item.data) {
                out.push(build_inscription(
                    tx,
                    InscriptionOrigin::OpReturn { output: out_idx, push: push_idx },
                    format.mime,
                    item.data.clone(),
                ));
            }
        }
    }

    out
}

/// Extracts and deduplicates inscriptions across every transaction in
/// a block. Dedup key: `(txid, content_type, SHA-256(payload))`.
pub fn extract_block_inscriptions(transactions: &[Transaction]) -> Vec<ExtractedInscription> {
    let mut seen: HashSet<(String, String, [u8; 32])> = HashSet::new();
    let mut out = Vec::new();

    for tx in transactions {
        for inscription in extract_tx_inscriptions(tx) {
            if seen.insert(inscription.dedup_key()) {
                out.push(inscription);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use starlight_types::{TxInput, TxOutput};

    fn push(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(data.len() as u8);
        out.extend_from_slice(data);
        out
    }

    fn envelope_bytes(content_type: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut bytes = push(b"ord");
        bytes.extend(push(content_type));
        bytes.extend(push(payload));
        bytes.push(0x68);
        bytes
    }

    fn tx_with_witness_item(item: Vec<u8>) -> Transaction {
        Transaction {
            version: 2,
            inputs: vec![TxInput { prev_txid: [0; 32], prev_index: 0, script_sig: vec![], sequence: 0 }],
            outputs: vec![TxOutput { value: 0, script_pubkey: vec![] }],
            locktime: 0,
            has_witness: true,
            witnesses: vec![vec![item]],
            txid: [0xAB; 32],
        }
    }

    #[test]
    fn text_inscription_round_trip_matches_scenario_1() {
        let tx = tx_with_witness_item(envelope_bytes(b"text/plain;charset=utf-8", b"hello world"));
        let inscriptions = extract_tx_inscriptions(&tx);
        assert_eq!(inscriptions.len(), 1);
        assert_eq!(inscriptions[0].content_type, "text/plain;charset=utf-8");
        assert_eq!(inscriptions[0].payload, b"hello world");
        assert_eq!(inscriptions[0].size_bytes, 11);
    }

    #[test]
    fn dedup_collapses_two_outputs_with_identical_png_payload() {
        let png_magic = crate::image_sig::PNG_MAGIC;
        let tx = Transaction {
            version: 2,
            inputs: vec![],
            outputs: vec![
                TxOutput { value: 0, script_pubkey: bitcoin_utils::script::build_op_return_script(png_magic).unwrap().into_bytes() },
                TxOutput { value: 0, script_pubkey: bitcoin_utils::script::build_op_return_script(png_magic).unwrap().into_bytes() },
            ],
            locktime: 0,
            has_witness: false,
            witnesses: vec![],
            txid: [0xCD; 32],
        };
        let inscriptions = extract_block_inscriptions(&[tx]);
        assert_eq!(inscriptions.len(), 1);
    }

    #[test]
    fn witness_file_name_follows_naming_scheme() {
        let tx = tx_with_witness_item(envelope_bytes(b"text/plain", b"x"));
        let inscriptions = extract_tx_inscriptions(&tx);
        assert!(inscriptions[0].file_name.ends_with("_in0_w0_i0.txt"));
    }
}
