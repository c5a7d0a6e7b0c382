//! Disperse Instruction Definitions
//!
//! Instruction data is an 8-byte method discriminator followed by the encoded
//! [`TransferPayload`]. The program pairs payload record *i* with remaining
//! account *i* of the recipient section, so ordering is part of the contract.
//!
//! The discriminator is Anchor-style but the payload is not a borsh `Vec`: no
//! `u32` length prefix follows the discriminator. The target program derives
//! the record count from the data length, so a stock Anchor handler taking
//! `Vec<RecipientRecord>` will not accept this data.

use crate::error::CodecError;
use crate::record::TransferPayload;

/// Method discriminators: `sha256("global:<method>")[..8]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionDiscriminator {
    TransferLamports,
    TransferSplTokens,
}

impl InstructionDiscriminator {
    pub const LEN: usize = 8;

    pub const fn bytes(self) -> [u8; 8] {
        match self {
            Self::TransferLamports => [62, 53, 201, 68, 102, 134, 83, 103],
            Self::TransferSplTokens => [20, 18, 113, 207, 62, 6, 205, 80],
        }
    }

    pub const fn method_name(self) -> &'static str {
        match self {
            Self::TransferLamports => "transfer_lamports",
            Self::TransferSplTokens => "transfer_spl_tokens",
        }
    }
}

impl TryFrom<[u8; 8]> for InstructionDiscriminator {
    type Error = CodecError;

    fn try_from(bytes: [u8; 8]) -> Result<Self, Self::Error> {
        [Self::TransferLamports, Self::TransferSplTokens]
            .into_iter()
            .find(|d| d.bytes() == bytes)
            .ok_or(CodecError::UnknownInstruction(bytes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisperseInstruction {
    /// Pay lamports from the signer to each recipient.
    ///
    /// Accounts:
    /// 0. `[]` System program
    ///
    /// Remaining accounts:
    /// 0. `[writable, signer]` Fee payer / source
    /// 1. `[writable]` System program
    /// 2.. `[writable]` Recipients, in payload order
    TransferLamports(TransferPayload),

    /// Pay SPL tokens from the signer's token account to each recipient token account.
    ///
    /// Accounts:
    /// 0. `[]` Token program
    ///
    /// Remaining accounts:
    /// 0. `[writable, signer]` Fee payer / authority
    /// 1. `[writable]` Source associated token account
    /// 2. `[writable]` Mint
    /// 3.. `[writable]` Destination associated token accounts, in payload order
    TransferSplTokens(TransferPayload),
}

impl DisperseInstruction {
    pub fn discriminator(&self) -> InstructionDiscriminator {
        match self {
            Self::TransferLamports(_) => InstructionDiscriminator::TransferLamports,
            Self::TransferSplTokens(_) => InstructionDiscriminator::TransferSplTokens,
        }
    }

    pub fn payload(&self) -> &TransferPayload {
        match self {
            Self::TransferLamports(payload) | Self::TransferSplTokens(payload) => payload,
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        let payload = self.payload();
        let mut data = Vec::with_capacity(InstructionDiscriminator::LEN + payload.encoded_len());
        data.extend_from_slice(&self.discriminator().bytes());
        payload.encode_into(&mut data);
        data
    }

    pub fn unpack(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < InstructionDiscriminator::LEN {
            return Err(CodecError::InstructionTooShort { len: data.len() });
        }
        let (tag, rest) = data.split_at(InstructionDiscriminator::LEN);
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(tag);

        let payload = TransferPayload::decode(rest)?;
        Ok(match InstructionDiscriminator::try_from(bytes)? {
            InstructionDiscriminator::TransferLamports => Self::TransferLamports(payload),
            InstructionDiscriminator::TransferSplTokens => Self::TransferSplTokens(payload),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecipientRecord;
    use sha2::{Digest, Sha256};

    fn sighash(name: &str) -> [u8; 8] {
        let hash = Sha256::digest(format!("global:{}", name).as_bytes());
        let mut out = [0u8; 8];
        out.copy_from_slice(&hash[..8]);
        out
    }

    #[test]
    fn test_discriminators_match_method_sighash() {
        for d in [
            InstructionDiscriminator::TransferLamports,
            InstructionDiscriminator::TransferSplTokens,
        ] {
            assert_eq!(d.bytes(), sighash(d.method_name()), "{}", d.method_name());
        }
    }

    #[test]
    fn test_pack_unpack() {
        let payload = TransferPayload::new(vec![
            RecipientRecord::new([1u8; 32], 10),
            RecipientRecord::new([2u8; 32], 20),
        ]);
        let ix = DisperseInstruction::TransferSplTokens(payload.clone());
        let data = ix.pack();

        assert_eq!(data.len(), 8 + 80);
        assert_eq!(&data[..8], &InstructionDiscriminator::TransferSplTokens.bytes());
        assert_eq!(TransferPayload::decode(&data[8..]).unwrap(), payload);
        assert_eq!(DisperseInstruction::unpack(&data).unwrap(), ix);
    }

    #[test]
    fn test_payload_follows_discriminator_directly() {
        let payload = TransferPayload::new(vec![RecipientRecord::new([7u8; 32], 5)]);
        let data = DisperseInstruction::TransferLamports(payload).pack();

        // First record starts at byte 8; a borsh Vec would put `1u32` there.
        assert_eq!(data.len(), 8 + 40);
        assert_eq!(&data[8..12], &[7u8; 4]);
        assert_ne!(&data[8..12], &1u32.to_le_bytes());
        assert_eq!(&data[40..48], &5u64.to_le_bytes());
    }

    #[test]
    fn test_unpack_errors() {
        assert_eq!(
            DisperseInstruction::unpack(&[1, 2, 3]),
            Err(CodecError::InstructionTooShort { len: 3 })
        );
        assert_eq!(
            DisperseInstruction::unpack(&[0u8; 8]),
            Err(CodecError::UnknownInstruction([0u8; 8]))
        );

        let mut data = DisperseInstruction::TransferLamports(TransferPayload::default()).pack();
        data.extend_from_slice(&[9u8; 12]);
        assert_eq!(
            DisperseInstruction::unpack(&data),
            Err(CodecError::MalformedPayload { len: 12 })
        );
    }
}
