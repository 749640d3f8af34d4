use embedded_storage::{ReadStorage, Storage};
use esp_println::println;
use esp_storage::FlashStorage;
use wavetrap::acquisition::TriggerBand;

use super::config::{BAND_SAVES, BAND_STORE_MAGIC, BAND_STORE_RECORD_LEN, BAND_STORE_VERSION};

/// Last-sector flash record keeping the trigger band across restarts.
/// Captures are never persisted; only the band is.
pub(crate) struct BandStore<'d> {
    flash: FlashStorage<'d>,
    offset: u32,
}

impl<'d> BandStore<'d> {
    pub(crate) fn new(flash_peripheral: esp_hal::peripherals::FLASH<'d>) -> Self {
        let flash = FlashStorage::new(flash_peripheral).multicore_auto_park();
        let capacity = flash.capacity() as u32;
        let offset = capacity.saturating_sub(FlashStorage::SECTOR_SIZE);
        Self { flash, offset }
    }

    pub(crate) fn load_band(&mut self) -> Option<TriggerBand> {
        let mut record = [0u8; BAND_STORE_RECORD_LEN];
        self.flash.read(self.offset, &mut record).ok()?;
        decode_record(&record)
    }

    pub(crate) fn save_band(&mut self, band: TriggerBand) {
        if self.load_band() == Some(band) {
            return;
        }

        let record = encode_record(band);
        let _ = self.flash.write(self.offset, &record);
    }
}

/// Foreground persistence: drains band values queued by the control surface
/// so flash writes stay out of request handlers and out of the tick context.
#[embassy_executor::task]
pub(crate) async fn band_store_task(mut store: BandStore<'static>) {
    loop {
        let band = BAND_SAVES.receive().await;
        store.save_band(band);
        println!("store: saved trigger band low={} high={}", band.low, band.high);
    }
}

fn decode_record(record: &[u8; BAND_STORE_RECORD_LEN]) -> Option<TriggerBand> {
    if record.iter().all(|&byte| byte == 0xFF) {
        return None;
    }
    if u32::from_le_bytes([record[0], record[1], record[2], record[3]]) != BAND_STORE_MAGIC {
        return None;
    }
    if record[4] != BAND_STORE_VERSION {
        return None;
    }
    let expected = checksum8(&record[..BAND_STORE_RECORD_LEN - 1]);
    if record[BAND_STORE_RECORD_LEN - 1] != expected {
        return None;
    }

    let low = u16::from_le_bytes([record[5], record[6]]);
    let high = u16::from_le_bytes([record[7], record[8]]);
    Some(TriggerBand::new(low, high))
}

fn encode_record(band: TriggerBand) -> [u8; BAND_STORE_RECORD_LEN] {
    let mut record = [0xFFu8; BAND_STORE_RECORD_LEN];
    record[0..4].copy_from_slice(&BAND_STORE_MAGIC.to_le_bytes());
    record[4] = BAND_STORE_VERSION;
    record[5..7].copy_from_slice(&band.low.to_le_bytes());
    record[7..9].copy_from_slice(&band.high.to_le_bytes());
    record[BAND_STORE_RECORD_LEN - 1] = checksum8(&record[..BAND_STORE_RECORD_LEN - 1]);
    record
}

fn checksum8(bytes: &[u8]) -> u8 {
    let mut acc = 0x5Au8;
    for &byte in bytes {
        acc ^= byte.rotate_left(1);
    }
    acc
}

#[cfg(test)]
mod tests {
    use wavetrap::acquisition::TriggerBand;

    use super::{checksum8, decode_record, encode_record, BAND_STORE_RECORD_LEN};

    #[test]
    fn record_roundtrip() {
        let band = TriggerBand::new(18_000, 24_000);
        let record = encode_record(band);
        assert_eq!(decode_record(&record), Some(band));
    }

    #[test]
    fn erased_flash_is_rejected() {
        let record = [0xFFu8; BAND_STORE_RECORD_LEN];
        assert_eq!(decode_record(&record), None);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut record = encode_record(TriggerBand::new(1, 2));
        record[4] = 9;
        record[BAND_STORE_RECORD_LEN - 1] = checksum8(&record[..BAND_STORE_RECORD_LEN - 1]);
        assert_eq!(decode_record(&record), None);
    }

    #[test]
    fn corrupt_checksum_is_rejected() {
        let mut record = encode_record(TriggerBand::new(1, 2));
        record[BAND_STORE_RECORD_LEN - 1] ^= 0x01;
        assert_eq!(decode_record(&record), None);
    }
}
