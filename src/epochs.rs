/// Number of blocks in one Celo epoch.
pub const EPOCH_SIZE: u64 = 17280;

/// Offset into an epoch (N > 1) at which the elected set is sampled. By then
/// the election at the epoch boundary has settled.
const ELECTION_SAMPLE_OFFSET: u64 = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpochBounds {
    pub start_block: u64,
    pub end_block: u64,
}

/// First and last block of `epoch`. Epoch 1 starts at block 1.
pub fn bounds(epoch: u64) -> EpochBounds {
    if epoch <= 1 {
        return EpochBounds {
            start_block: 1,
            end_block: EPOCH_SIZE,
        };
    }
    EpochBounds {
        start_block: (epoch - 1) * EPOCH_SIZE + 1,
        end_block: epoch * EPOCH_SIZE,
    }
}

/// Maps a block to the epoch containing it. Block 0 means "never" and maps
/// to epoch 0.
pub fn block_to_epoch(block: u64) -> u64 {
    if block == 0 {
        return 0;
    }
    let epoch = block / EPOCH_SIZE;
    if block % EPOCH_SIZE == 0 {
        epoch
    } else {
        epoch + 1
    }
}

pub fn election_sample_block(epoch: u64) -> u64 {
    if epoch <= 1 {
        EPOCH_SIZE / 2
    } else {
        (epoch - 1) * EPOCH_SIZE + ELECTION_SAMPLE_OFFSET
    }
}
