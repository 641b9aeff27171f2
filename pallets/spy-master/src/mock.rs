use crate as pallet_spy_master;
use frame_support::{derive_impl, parameter_types};
use sp_core::{sr25519, Pair};
use sp_runtime::BuildStorage;
use spymaster_primitives::{AgentId, ProvenanceMode, SignedCertificate, Symbol};
use spymaster_prover::Prover;

type Block = frame_system::mocking::MockBlock<Test>;

frame_support::construct_runtime!(
    pub enum Test {
        System: frame_system,
        SpyMaster: pallet_spy_master,
    }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
    type Block = Block;
}

/// Seed of the prover key the mock runtime trusts.
pub const PROVER_SEED: [u8; 32] = [7u8; 32];

pub const ALICE: u64 = 1;
pub const BOB: u64 = 2;

parameter_types! {
    pub ProverKey: sr25519::Public = sr25519::Pair::from_seed(&PROVER_SEED).public();
    pub static Provenance: ProvenanceMode = ProvenanceMode::CertifiedOnly;
}

impl pallet_spy_master::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type Certificate = SignedCertificate;
    type Verifier = pallet_spy_master::Sr25519Verifier<ProverKey>;
    type Provenance = Provenance;
    type WeightInfo = pallet_spy_master::DefaultWeightInfo;
}

/// Prover holding the trusted key.
pub fn trusted_prover() -> Prover {
    Prover::from_seed(&PROVER_SEED)
}

pub struct ExtBuilder {
    agents: Vec<(AgentId, (Symbol, Symbol))>,
    provenance: ProvenanceMode,
}

impl Default for ExtBuilder {
    fn default() -> Self {
        Self { agents: vec![], provenance: ProvenanceMode::CertifiedOnly }
    }
}

impl ExtBuilder {
    pub fn with_agents(mut self, agents: Vec<(AgentId, (Symbol, Symbol))>) -> Self {
        self.agents = agents;
        self
    }

    pub fn provenance(mut self, mode: ProvenanceMode) -> Self {
        self.provenance = mode;
        self
    }

    pub fn build(self) -> sp_io::TestExternalities {
        Provenance::set(self.provenance);

        let storage = RuntimeGenesisConfig {
            system: Default::default(),
            spy_master: pallet_spy_master::GenesisConfig {
                agents: self.agents,
                ..Default::default()
            },
        }
        .build_storage()
        .unwrap();

        let mut ext = sp_io::TestExternalities::new(storage);
        ext.execute_with(|| System::set_block_number(1));
        ext
    }
}

pub fn new_test_ext() -> sp_io::TestExternalities {
    ExtBuilder::default().build()
}
