#![no_std]
#![no_main]

use asl_glove::ble;
use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::{clock::CpuClock, rng::Rng, timer::timg::TimerGroup};
use esp_println as _;
use esp_wifi::EspWifiController;
use static_cell::StaticCell;

static RADIO: StaticCell<EspWifiController<'static>> = StaticCell::new();

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));

    // The BLE controller allocates its buffers on the heap
    esp_alloc::heap_allocator!(72 * 1024);

    defmt::info!("Starting BLE Sensor Peripheral");

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let rng = Rng::new(peripherals.RNG);

    let init = match esp_wifi::init(timg0.timer0, rng, peripherals.RADIO_CLK) {
        Ok(init) => RADIO.init(init),
        Err(e) => {
            defmt::error!("Bluetooth init failed: {:?}", defmt::Debug2Format(&e));
            return;
        }
    };

    let timg1 = TimerGroup::new(peripherals.TIMG1);
    esp_hal_embassy::init(timg1.timer0);

    spawner.must_spawn(ble::driver::start(peripherals.BT, init, rng));
}
