//! # SpyMaster Pallet
//!
//! Agent directory with authenticated, replay-protected messages.
//!
//! Every agent holds a two-symbol security code and a message counter. A
//! message is accepted only when it carries the agent's code, a 12-symbol
//! body and a message number strictly greater than the last one accepted.
//!
//! ## Entry points
//! - `add_agent`: register (or reset) an agent with `last_message = 0`.
//! - `process_message`: validate a message on-chain and advance the counter.
//! - `set_last_message`: the proof-gated path. Validation ran off-chain and
//!   produced a certificate; the pallet verifies the certificate through
//!   `Config::Verifier`, binds its public input to the live record, and
//!   commits its public output.
//!
//! Both update paths share one validator (`spymaster_primitives::validate`),
//! so a certificate attests to exactly the rules `process_message` enforces.
//!
//! ## Block-info indexer
//! Accepted transitions are stamped with `(block_height, sender, nonce)`:
//! - `AgentToBlockInfo`: agent → most recent provenance (overwritten).
//! - `BlockHeights`: height → agent (last write wins on collision).
//!
//! Registration always restamps the forward entry, so it never points at a
//! counter the reset erased. Certified updates are always indexed in both
//! maps. `Config::Provenance` decides whether direct messages are too.
//!
//! ## Atomicity
//! All checks run before the first storage write, and dispatch is
//! transactional, so a rejected call leaves the directory untouched.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
pub use pallet::*;

pub mod verifier;

#[cfg(test)]
mod mock;


pub use verifier::Sr25519Verifier;

const LOG_TARGET: &str = "runtime::spy-master";

#[frame_support::pallet]
pub mod pallet {
    use super::LOG_TARGET;
    use alloc::vec::Vec;
    use frame_support::pallet_prelude::*;
    use frame_system::pallet_prelude::*;
    use spymaster_primitives::*;

    /// Provenance triple as stored by this runtime.
    pub type BlockInfoOf<T> = BlockInfo<
        BlockNumberFor<T>,
        <T as frame_system::Config>::AccountId,
        <T as frame_system::Config>::Nonce,
    >;

    // ================================================================
    // Pallet configuration
    // ================================================================

    #[pallet::config]
    pub trait Config: frame_system::Config {
        /// The overarching runtime event type.
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Detached certificate accepted by `set_last_message`.
        type Certificate: Parameter;

        /// Checks certificates and recovers the claim they prove.
        type Verifier: CertificateVerifier<Self::Certificate>;

        /// Which transitions the block-info indexer records.
        #[pallet::constant]
        type Provenance: Get<ProvenanceMode>;

        type WeightInfo: WeightInfo;
    }

    pub trait WeightInfo {
        fn add_agent() -> Weight;
        fn process_message() -> Weight;
        fn set_last_message() -> Weight;
    }

    pub struct DefaultWeightInfo;
    impl WeightInfo for DefaultWeightInfo {
        fn add_agent() -> Weight { Weight::from_parts(20_000_000, 0) }
        fn process_message() -> Weight { Weight::from_parts(40_000_000, 0) }
        // Dominated by the sr25519 verification host call.
        fn set_last_message() -> Weight { Weight::from_parts(120_000_000, 0) }
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    // ================================================================
    // Storage
    // ================================================================

    /// Map: AgentId → AgentRecord.
    #[pallet::storage]
    pub type Agents<T: Config> =
        StorageMap<_, Blake2_128Concat, AgentId, AgentRecord, OptionQuery>;

    /// Map: block height → agent that transitioned at that height.
    #[pallet::storage]
    pub type BlockHeights<T: Config> =
        StorageMap<_, Blake2_128Concat, BlockNumberFor<T>, AgentId, OptionQuery>;

    /// Map: AgentId → provenance of its most recent indexed transition.
    #[pallet::storage]
    pub type AgentToBlockInfo<T: Config> =
        StorageMap<_, Blake2_128Concat, AgentId, BlockInfoOf<T>, OptionQuery>;

    // ================================================================
    // Genesis Config
    // ================================================================

    #[pallet::genesis_config]
    #[derive(frame_support::DefaultNoBound)]
    pub struct GenesisConfig<T: Config> {
        /// Agents registered at genesis as `(agent_id, (char0, char1))`.
        pub agents: Vec<(AgentId, (Symbol, Symbol))>,
        #[serde(skip)]
        pub _phantom: core::marker::PhantomData<T>,
    }

    #[pallet::genesis_build]
    impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
        fn build(&self) {
            for (agent_id, code) in &self.agents {
                Agents::<T>::insert(agent_id, register(*agent_id, SecurityCode::from(*code)));
            }
        }
    }

    // ================================================================
    // Events
    // ================================================================

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// An agent was registered or reset to `last_message = 0`.
        AgentAdded {
            agent_id: AgentId,
            who: T::AccountId,
        },
        /// A directly submitted message was accepted.
        MessageProcessed {
            agent_id: AgentId,
            message_number: MessageNumber,
            who: T::AccountId,
        },
        /// A certified counter update was committed and indexed.
        LastMessageCertified {
            agent_id: AgentId,
            message_number: MessageNumber,
            block_height: BlockNumberFor<T>,
            who: T::AccountId,
        },
    }

    // ================================================================
    // Errors
    // ================================================================

    #[pallet::error]
    pub enum Error<T> {
        /// Agent is not registered.
        AgentNotFound,
        /// Security code does not match.
        CredentialMismatch,
        /// Message length is not 12 characters.
        InvalidLength,
        /// Message number is not greater than the last message number.
        StaleOrReplayed,
        /// Certificate failed verification, or was produced against a record
        /// that is no longer current.
        InvalidCertificate,
    }

    impl<T> From<ValidationError> for Error<T> {
        fn from(err: ValidationError) -> Self {
            match err {
                ValidationError::CredentialMismatch => Error::<T>::CredentialMismatch,
                ValidationError::InvalidLength => Error::<T>::InvalidLength,
                ValidationError::StaleOrReplayed => Error::<T>::StaleOrReplayed,
            }
        }
    }

    // ================================================================
    // Extrinsics
    // ================================================================

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Register an agent, or reset an existing one.
        ///
        /// No precondition on prior existence: re-registration overwrites the
        /// security code and sets `last_message` back to zero. Meant for
        /// bootstrap and testing, not production identity issuance.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::add_agent())]
        pub fn add_agent(
            origin: OriginFor<T>,
            agent_id: AgentId,
            security_code: SecurityCode,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let info = Self::block_info(&who);

            Agents::<T>::insert(agent_id, register(agent_id, security_code));
            // Forward index only: the reset counter must not shadow a
            // certified transition in `BlockHeights`.
            AgentToBlockInfo::<T>::insert(agent_id, info);

            Self::deposit_event(Event::AgentAdded { agent_id, who });
            Ok(())
        }

        /// Validate a message against its agent and advance the counter.
        ///
        /// Checks, in order: security code, body length, message number.
        /// The first failing check is the error returned; nothing is written.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::process_message())]
        pub fn process_message(origin: OriginFor<T>, message: Message) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let agent_id = message.agent_id;
            let record = Self::agent(agent_id)?;

            let updated = apply_message(&record, &message).map_err(|err| {
                log::debug!(
                    target: LOG_TARGET,
                    "message {} for agent {} rejected: {}",
                    message.message_number,
                    agent_id,
                    err,
                );
                Error::<T>::from(err)
            })?;

            Agents::<T>::insert(agent_id, &updated);
            if T::Provenance::get().tracks_direct_updates() {
                Self::note_transition(agent_id, Self::block_info(&who));
            }

            Self::deposit_event(Event::MessageProcessed {
                agent_id,
                message_number: updated.last_message,
                who,
            });
            Ok(())
        }

        /// Commit a counter update proven off-chain.
        ///
        /// The certificate must verify, its public input must equal the
        /// agent's current record, and its public output must be greater
        /// than the current `last_message`. The transition is always indexed.
        #[pallet::call_index(2)]
        #[pallet::weight(T::WeightInfo::set_last_message())]
        pub fn set_last_message(
            origin: OriginFor<T>,
            agent_id: AgentId,
            certificate: T::Certificate,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let record = Self::agent(agent_id)?;

            let claim = T::Verifier::verify(&certificate).ok_or_else(|| {
                log::debug!(target: LOG_TARGET, "certificate for agent {} did not verify", agent_id);
                Error::<T>::InvalidCertificate
            })?;
            let updated = bind_claim(&record, &claim).map_err(|rejection| {
                log::debug!(
                    target: LOG_TARGET,
                    "certificate for agent {} not bound to live record: {:?}",
                    agent_id,
                    rejection,
                );
                Error::<T>::InvalidCertificate
            })?;

            let info = Self::block_info(&who);
            let block_height = info.block_height;

            Agents::<T>::insert(agent_id, &updated);
            Self::note_transition(agent_id, info);

            Self::deposit_event(Event::LastMessageCertified {
                agent_id,
                message_number: updated.last_message,
                block_height,
                who,
            });
            Ok(())
        }
    }

    // ================================================================
    // Internal helpers + queries
    // ================================================================

    impl<T: Config> Pallet<T> {
        /// Look up an agent. Absence is fatal to every update path.
        pub fn agent(agent_id: AgentId) -> Result<AgentRecord, Error<T>> {
            Agents::<T>::get(agent_id).ok_or(Error::<T>::AgentNotFound)
        }

        /// Capture the host context for the current call.
        fn block_info(who: &T::AccountId) -> BlockInfoOf<T> {
            BlockInfo {
                block_height: <frame_system::Pallet<T>>::block_number(),
                transaction_sender: who.clone(),
                sender_nonce: <frame_system::Pallet<T>>::account_nonce(who),
            }
        }

        /// Write both indexes for one accepted transition.
        fn note_transition(agent_id: AgentId, info: BlockInfoOf<T>) {
            BlockHeights::<T>::insert(info.block_height, agent_id);
            AgentToBlockInfo::<T>::insert(agent_id, info);
        }

        /// Agent that transitioned at `height`, if any.
        pub fn agent_at_height(height: BlockNumberFor<T>) -> Option<AgentId> {
            BlockHeights::<T>::get(height)
        }

        /// Provenance of the agent's most recent indexed transition.
        pub fn block_info_of(agent_id: AgentId) -> Option<BlockInfoOf<T>> {
            AgentToBlockInfo::<T>::get(agent_id)
        }

        /// Current record of the agent that transitioned at `height`.
        pub fn data_from_block_height(height: BlockNumberFor<T>) -> Option<AgentRecord> {
            Self::agent_at_height(height).and_then(|agent_id| Agents::<T>::get(agent_id))
        }

        /// Agent and provenance recorded for `height`.
        ///
        /// `None` when the agent's forward entry has since been overwritten
        /// by a later transition, since the triple no longer describes `height`.
        pub fn provenance_at(height: BlockNumberFor<T>) -> Option<(AgentId, BlockInfoOf<T>)> {
            let agent_id = Self::agent_at_height(height)?;
            AgentToBlockInfo::<T>::get(agent_id)
                .filter(|info| info.block_height == height)
                .map(|info| (agent_id, info))
        }
    }

    // ================================================================
    // Trait implementation for cross-pallet use
    // ================================================================

    impl<T: Config> AgentDirectoryInterface<BlockNumberFor<T>> for Pallet<T> {
        fn is_registered(agent_id: AgentId) -> bool {
            Agents::<T>::contains_key(agent_id)
        }

        fn last_message(agent_id: AgentId) -> Option<MessageNumber> {
            Agents::<T>::get(agent_id).map(|r| r.last_message)
        }

        fn agent_at_height(height: BlockNumberFor<T>) -> Option<AgentId> {
            Self::agent_at_height(height)
        }
    }
}
