//! Transaction construction, signing and decoding.
//!
//! Every builder funnels into [`KlayFacade::build_transaction`], which picks
//! the fee-delegation variant from the ratio: `0` builds the basic variant,
//! `100` the fully delegated one and anything else the partially delegated
//! one carrying the ratio.

use crate::{decode_hex, FacadeError, KlayFacade};
use klay_account::Role;
use klay_transaction::{select_variant, Transaction, TransactionDescriptor, TransactionKind};
use klay_types::{truncate_id, AccountKey, Address, Bytes, U256};
use tracing::instrument;

impl KlayFacade {
	/// Builds a transaction of `kind` from `descriptor`.
	///
	/// A descriptor without a chain id is bound to the facade's chain.
	#[instrument(skip_all, fields(%kind, ratio))]
	pub fn build_transaction(
		&self,
		kind: TransactionKind,
		mut descriptor: TransactionDescriptor,
		ratio: i64,
	) -> Result<Transaction, FacadeError> {
		if descriptor.chain_id == 0 {
			descriptor.chain_id = self.chain_id;
		}

		tracing::info!(
			from = %descriptor.from,
			to = ?descriptor.to,
			value = ?descriptor.value,
			gas = descriptor.gas,
			gas_price = ?descriptor.gas_price,
			nonce = ?descriptor.nonce,
			chain_id = descriptor.chain_id,
			"Building transaction"
		);
		tracing::debug!(
			input = ?descriptor.input,
			account_key = ?descriptor.account_key,
			"Transaction payload"
		);

		let (variant, descriptor) = select_variant(kind, ratio, descriptor);
		let tx = Transaction::from_descriptor(variant, descriptor)?;
		tracing::debug!(%variant, type_tag = tx.type_tag(), "Built transaction");
		Ok(tx)
	}

	pub fn value_transfer(
		&self,
		from: Address,
		to: Address,
		value: U256,
		gas: u64,
		ratio: i64,
	) -> Result<Transaction, FacadeError> {
		let descriptor = TransactionDescriptor::new(from, gas)
			.with_to(to)
			.with_value(value);
		self.build_transaction(TransactionKind::ValueTransfer, descriptor, ratio)
	}

	pub fn value_transfer_memo(
		&self,
		from: Address,
		to: Address,
		value: U256,
		memo: Bytes,
		gas: u64,
		ratio: i64,
	) -> Result<Transaction, FacadeError> {
		let descriptor = TransactionDescriptor::new(from, gas)
			.with_to(to)
			.with_value(value)
			.with_input(memo);
		self.build_transaction(TransactionKind::ValueTransferMemo, descriptor, ratio)
	}

	/// Builds a contract deployment. `value` defaults to zero.
	pub fn smart_contract_deploy(
		&self,
		from: Address,
		bytecode: Bytes,
		value: Option<U256>,
		gas: u64,
		ratio: i64,
	) -> Result<Transaction, FacadeError> {
		let mut descriptor = TransactionDescriptor::new(from, gas).with_input(bytecode);
		descriptor.value = value;
		self.build_transaction(TransactionKind::SmartContractDeploy, descriptor, ratio)
	}

	/// Builds a contract call. `value` defaults to zero.
	pub fn smart_contract_execution(
		&self,
		from: Address,
		to: Address,
		input: Bytes,
		value: Option<U256>,
		gas: u64,
		ratio: i64,
	) -> Result<Transaction, FacadeError> {
		let mut descriptor = TransactionDescriptor::new(from, gas)
			.with_to(to)
			.with_input(input);
		descriptor.value = value;
		self.build_transaction(TransactionKind::SmartContractExecution, descriptor, ratio)
	}

	pub fn account_update(
		&self,
		from: Address,
		account_key: AccountKey,
		gas: u64,
		ratio: i64,
	) -> Result<Transaction, FacadeError> {
		let descriptor = TransactionDescriptor::new(from, gas).with_account_key(account_key);
		self.build_transaction(TransactionKind::AccountUpdate, descriptor, ratio)
	}

	/// Builds a cancel for the pending transaction with `nonce`.
	pub fn cancel(
		&self,
		from: Address,
		nonce: u64,
		gas: u64,
		ratio: i64,
	) -> Result<Transaction, FacadeError> {
		let descriptor = TransactionDescriptor::new(from, gas).with_nonce(nonce);
		self.build_transaction(TransactionKind::Cancel, descriptor, ratio)
	}

	pub fn chain_data_anchoring(
		&self,
		from: Address,
		data: Bytes,
		gas: u64,
		ratio: i64,
	) -> Result<Transaction, FacadeError> {
		let descriptor = TransactionDescriptor::new(from, gas).with_input(data);
		self.build_transaction(TransactionKind::ChainDataAnchoring, descriptor, ratio)
	}

	/// Signs `tx` as its sender with the keyring registered for `tx.from`.
	///
	/// Account updates sign with the account-update role, everything else
	/// with the transaction role. Nonce and gas price are taken from the
	/// node when unset.
	#[instrument(skip_all, fields(from = %tx.from, variant = %tx.variant))]
	pub async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction, FacadeError> {
		let keyring = self.require_keyring(tx.from).await?;
		self.fill_from_node(&mut tx).await?;

		let role = if tx.is_account_update() {
			Role::AccountUpdate
		} else {
			Role::Transaction
		};
		let hash = tx.signature_hash()?;
		let signatures = keyring.sign_transaction_hash(&hash, tx.chain_id, role)?;
		tx.append_signatures(signatures);

		tracing::info!(
			signatures = tx.signatures.len(),
			sig_hash = %truncate_id(&hash.to_string()),
			"Signed transaction"
		);
		Ok(tx)
	}

	/// Signs a fee-delegated `tx` as `fee_payer`.
	#[instrument(skip_all, fields(%fee_payer, variant = %tx.variant))]
	pub async fn sign_as_fee_payer(
		&self,
		fee_payer: Address,
		mut tx: Transaction,
	) -> Result<Transaction, FacadeError> {
		let keyring = self.require_keyring(fee_payer).await?;
		if !tx.variant.is_fee_delegated() {
			return Err(klay_transaction::TransactionError::NotFeeDelegated(tx.variant).into());
		}
		self.fill_from_node(&mut tx).await?;

		let hash = tx.fee_payer_signature_hash(fee_payer)?;
		let signatures = keyring.sign_transaction_hash(&hash, tx.chain_id, Role::FeePayer)?;
		tx.append_fee_payer_signatures(fee_payer, signatures)?;

		tracing::info!(
			signatures = tx.fee_payer_signatures.len(),
			sig_hash = %truncate_id(&hash.to_string()),
			"Signed transaction as fee payer"
		);
		Ok(tx)
	}

	/// Decodes a hex raw transaction, with or without the `0x` prefix.
	pub fn decode_raw_transaction(&self, raw: &str) -> Result<Transaction, FacadeError> {
		let bytes = decode_hex(raw)?;
		let tx = Transaction::decode(&bytes)?;
		tracing::debug!(variant = %tx.variant, from = %tx.from, "Decoded raw transaction");
		Ok(tx)
	}

	async fn fill_from_node(&self, tx: &mut Transaction) -> Result<(), FacadeError> {
		if tx.nonce.is_none() {
			let nonce = self.node.get_nonce(tx.from).await?;
			tracing::debug!(nonce, "Filled nonce from node");
			tx.nonce = Some(nonce);
		}
		if tx.gas_price.is_none() {
			let gas_price = self.node.get_gas_price().await?;
			tracing::debug!(%gas_price, "Filled gas price from node");
			tx.gas_price = Some(gas_price);
		}
		Ok(())
	}
}
