use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::adc::{Adc, AdcChannel};
use embassy_stm32::gpio::{Level, Output, Speed};
use strike_core::addressing::ChannelAddressing;
use strike_core::channels::XYLOPHONE_CHANNELS;
use strike_core::config::ScanConfig;
use strike_core::sampler::Sampler;
use strike_core::scan::ScanLoop;

use crate::board;
use crate::clock::FirmwareInstant;
use crate::events::EventQueue;
use crate::hw::{AdcBank, BusyWait, SelectPin};

mod diagnostics_task;
mod scan_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) static EVENT_QUEUE: EventQueue = EventQueue::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        ADC1,
        PA0,
        PA1,
        PA2,
        PA3,
        PA4,
        PA5,
        PA6,
        PA7,
        PB0,
        PB1,
        PB3,
        PB4,
        PB5,
        PB6,
        ..
    } = hal::init(config);

    let select = [
        SelectPin::new(Output::new(PB3, Level::Low, Speed::Low)),
        SelectPin::new(Output::new(PB4, Level::Low, Speed::Low)),
        SelectPin::new(Output::new(PB5, Level::Low, Speed::Low)),
        SelectPin::new(Output::new(PB6, Level::Low, Speed::Low)),
    ];
    let bank = AdcBank::new(
        Adc::new(ADC1),
        [
            PA0.degrade_adc(),
            PA1.degrade_adc(),
            PA2.degrade_adc(),
            PA3.degrade_adc(),
            PA5.degrade_adc(),
            PA6.degrade_adc(),
            PA7.degrade_adc(),
            PB0.degrade_adc(),
            PB1.degrade_adc(),
        ],
        PA4.degrade_adc(),
    );

    let scan_config = ScanConfig::default();
    let sampler = Sampler::new(ChannelAddressing::new(select), bank, BusyWait, &scan_config);
    let scan = ScanLoop::<FirmwareInstant>::new(
        scan_config,
        &XYLOPHONE_CHANNELS,
        FirmwareInstant::from(embassy_time::Instant::now()),
    )
    .expect("board channel catalog rejected");

    defmt::info!(
        "board: {} direct inputs {}..{}, mux on {} select {} {} {} {}, {}-bit",
        board::DIRECT_BANK.len(),
        board::DIRECT_BANK[0].name,
        board::DIRECT_BANK[board::DIRECT_BANK.len() - 1].name,
        board::MUX_SIGNAL.name,
        board::MUX_SELECT[0],
        board::MUX_SELECT[1],
        board::MUX_SELECT[2],
        board::MUX_SELECT[3],
        board::ADC_BITS
    );

    spawner
        .spawn(scan_task::run(scan, sampler, EVENT_QUEUE.sender()))
        .expect("failed to spawn scan task");

    spawner
        .spawn(diagnostics_task::run(EVENT_QUEUE.receiver()))
        .expect("failed to spawn diagnostics task");

    core::future::pending::<()>().await;
}
