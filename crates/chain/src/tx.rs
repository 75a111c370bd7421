//! Programmable transaction model and its BCS wire encoding
//!
//! Only the subset of the ledger's transaction format this tool submits is
//! modelled: owned-object and pure inputs, `SplitCoins` and
//! `TransferObjects` commands, and V1 transaction data without expiration.
//!
//! BCS rules used here:
//! - sequence lengths and enum variant tags are ULEB128
//! - integers are little-endian
//! - addresses and object ids are 32 raw bytes
//! - object digests are a length-prefixed byte vector

use linkdrop_core::{Address, ObjectRef};
use linkdrop_crypto::blake2b256;

/// Enum variant tags
mod tag {
    pub const TRANSACTION_DATA_V1: u64 = 0;
    pub const KIND_PROGRAMMABLE: u64 = 0;
    pub const CALL_ARG_PURE: u64 = 0;
    pub const CALL_ARG_OBJECT: u64 = 1;
    pub const OBJECT_ARG_IMM_OR_OWNED: u64 = 0;
    pub const COMMAND_TRANSFER_OBJECTS: u64 = 1;
    pub const COMMAND_SPLIT_COINS: u64 = 2;
    pub const ARGUMENT_GAS_COIN: u64 = 0;
    pub const ARGUMENT_INPUT: u64 = 1;
    pub const ARGUMENT_RESULT: u64 = 2;
    pub const ARGUMENT_NESTED_RESULT: u64 = 3;
    pub const EXPIRATION_NONE: u64 = 0;
}

/// Hash salt for transaction digests
const TRANSACTION_DATA_SALT: &[u8] = b"TransactionData::";

fn write_uleb128(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

fn write_object_ref(buf: &mut Vec<u8>, obj: &ObjectRef) {
    buf.extend_from_slice(obj.object_id.as_bytes());
    buf.extend_from_slice(&obj.version.to_le_bytes());
    write_uleb128(buf, 32);
    buf.extend_from_slice(obj.digest.as_bytes());
}

/// A transaction input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    /// BCS-encoded pure value
    Pure(Vec<u8>),
    /// Owned (or immutable) object at a specific version
    Object(ObjectRef),
}

impl CallArg {
    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            CallArg::Pure(bytes) => {
                write_uleb128(buf, tag::CALL_ARG_PURE);
                write_uleb128(buf, bytes.len() as u64);
                buf.extend_from_slice(bytes);
            }
            CallArg::Object(obj) => {
                write_uleb128(buf, tag::CALL_ARG_OBJECT);
                write_uleb128(buf, tag::OBJECT_ARG_IMM_OR_OWNED);
                write_object_ref(buf, obj);
            }
        }
    }
}

/// Reference to a value inside a programmable transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Argument {
    /// The gas payment coin (after smashing all payment coins together)
    GasCoin,
    /// Transaction input by index
    Input(u16),
    /// Whole result of a previous command
    Result(u16),
    /// One element of a previous command's result vector
    NestedResult(u16, u16),
}

impl Argument {
    fn encode(&self, buf: &mut Vec<u8>) {
        match *self {
            Argument::GasCoin => write_uleb128(buf, tag::ARGUMENT_GAS_COIN),
            Argument::Input(i) => {
                write_uleb128(buf, tag::ARGUMENT_INPUT);
                buf.extend_from_slice(&i.to_le_bytes());
            }
            Argument::Result(i) => {
                write_uleb128(buf, tag::ARGUMENT_RESULT);
                buf.extend_from_slice(&i.to_le_bytes());
            }
            Argument::NestedResult(i, j) => {
                write_uleb128(buf, tag::ARGUMENT_NESTED_RESULT);
                buf.extend_from_slice(&i.to_le_bytes());
                buf.extend_from_slice(&j.to_le_bytes());
            }
        }
    }
}

fn encode_arguments(buf: &mut Vec<u8>, args: &[Argument]) {
    write_uleb128(buf, args.len() as u64);
    for arg in args {
        arg.encode(buf);
    }
}

/// A programmable transaction command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send the listed objects to an address argument
    TransferObjects(Vec<Argument>, Argument),
    /// Split a coin into new coins with the listed amounts
    SplitCoins(Argument, Vec<Argument>),
}

impl Command {
    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Command::TransferObjects(objects, recipient) => {
                write_uleb128(buf, tag::COMMAND_TRANSFER_OBJECTS);
                encode_arguments(buf, objects);
                recipient.encode(buf);
            }
            Command::SplitCoins(coin, amounts) => {
                write_uleb128(buf, tag::COMMAND_SPLIT_COINS);
                coin.encode(buf);
                encode_arguments(buf, amounts);
            }
        }
    }
}

/// Inputs and commands of a programmable transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgrammableTransaction {
    pub inputs: Vec<CallArg>,
    pub commands: Vec<Command>,
}

impl ProgrammableTransaction {
    fn encode(&self, buf: &mut Vec<u8>) {
        write_uleb128(buf, self.inputs.len() as u64);
        for input in &self.inputs {
            input.encode(buf);
        }
        write_uleb128(buf, self.commands.len() as u64);
        for command in &self.commands {
            command.encode(buf);
        }
    }

    /// Object ids of every owned-object input
    pub fn object_inputs(&self) -> impl Iterator<Item = &ObjectRef> {
        self.inputs.iter().filter_map(|input| match input {
            CallArg::Object(obj) => Some(obj),
            CallArg::Pure(_) => None,
        })
    }
}

/// Incremental builder for a [`ProgrammableTransaction`]
#[derive(Debug, Default)]
pub struct ProgrammableTransactionBuilder {
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
}

impl ProgrammableTransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn input(&mut self, arg: CallArg) -> Argument {
        // Identical inputs are shared, as the ledger rejects duplicated objects
        if let Some(pos) = self.inputs.iter().position(|existing| *existing == arg) {
            return Argument::Input(pos as u16);
        }
        self.inputs.push(arg);
        Argument::Input((self.inputs.len() - 1) as u16)
    }

    /// Pure `u64` input
    pub fn pure_u64(&mut self, value: u64) -> Argument {
        self.input(CallArg::Pure(value.to_le_bytes().to_vec()))
    }

    /// Pure `address` input
    pub fn pure_address(&mut self, address: Address) -> Argument {
        self.input(CallArg::Pure(address.as_bytes().to_vec()))
    }

    /// Owned object input
    pub fn object(&mut self, obj: ObjectRef) -> Argument {
        self.input(CallArg::Object(obj))
    }

    /// Split `coin` into one new coin per amount. Returns one argument per
    /// created coin, in amount order.
    pub fn split_coins(&mut self, coin: Argument, amounts: Vec<Argument>) -> Vec<Argument> {
        let count = amounts.len() as u16;
        let index = self.commands.len() as u16;
        self.commands.push(Command::SplitCoins(coin, amounts));
        (0..count).map(|j| Argument::NestedResult(index, j)).collect()
    }

    pub fn transfer_objects(&mut self, objects: Vec<Argument>, recipient: Argument) {
        self.commands.push(Command::TransferObjects(objects, recipient));
    }

    pub fn finish(self) -> ProgrammableTransaction {
        ProgrammableTransaction {
            inputs: self.inputs,
            commands: self.commands,
        }
    }
}

/// Who pays for a transaction, and how much
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasData {
    pub payment: Vec<ObjectRef>,
    pub owner: Address,
    pub price: u64,
    pub budget: u64,
}

/// Complete unsigned transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionData {
    pub kind: ProgrammableTransaction,
    pub sender: Address,
    pub gas_data: GasData,
}

impl TransactionData {
    /// Programmable transaction paid and owned by `sender`
    pub fn new_programmable(
        sender: Address,
        gas_payment: Vec<ObjectRef>,
        kind: ProgrammableTransaction,
        gas_budget: u64,
        gas_price: u64,
    ) -> Self {
        Self {
            kind,
            sender,
            gas_data: GasData {
                payment: gas_payment,
                owner: sender,
                price: gas_price,
                budget: gas_budget,
            },
        }
    }

    /// BCS encoding, the bytes that get signed and submitted
    pub fn to_bcs(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);
        write_uleb128(&mut buf, tag::TRANSACTION_DATA_V1);
        write_uleb128(&mut buf, tag::KIND_PROGRAMMABLE);
        self.kind.encode(&mut buf);
        buf.extend_from_slice(self.sender.as_bytes());

        write_uleb128(&mut buf, self.gas_data.payment.len() as u64);
        for obj in &self.gas_data.payment {
            write_object_ref(&mut buf, obj);
        }
        buf.extend_from_slice(self.gas_data.owner.as_bytes());
        buf.extend_from_slice(&self.gas_data.price.to_le_bytes());
        buf.extend_from_slice(&self.gas_data.budget.to_le_bytes());

        write_uleb128(&mut buf, tag::EXPIRATION_NONE);
        buf
    }

    /// Transaction digest: base58(BLAKE2b-256(salt || bcs))
    pub fn digest(&self) -> String {
        let bcs = self.to_bcs();
        let mut salted = Vec::with_capacity(TRANSACTION_DATA_SALT.len() + bcs.len());
        salted.extend_from_slice(TRANSACTION_DATA_SALT);
        salted.extend_from_slice(&bcs);
        bs58::encode(blake2b256(&salted)).into_string()
    }
}
