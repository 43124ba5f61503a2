//! SDAccel/Vitis OpenCL backend for a real accelerator card.
//!
//! The card is programmed with an xclbin whose single compute unit exposes
//! the squaring kernel; each job is one `enqueueTask`-style dispatch with a
//! blocking write of the input buffer before it and a blocking read of the
//! output buffer after.

use std::fs;
use std::path::{Path, PathBuf};
use std::ptr;

use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::device::{
    get_all_devices, Device as ClDevice, CL_DEVICE_TYPE_ACCELERATOR, CL_DEVICE_TYPE_ALL,
};
use opencl3::kernel::{ExecuteKernel, Kernel};
use opencl3::memory::{Buffer, CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY};
use opencl3::program::Program;
use opencl3::types::{cl_uint, CL_BLOCKING};

use crate::align::AlignedWords;
use crate::geometry::Geometry;
use crate::{tables, words, Device, Error, Job, JobOutput, Result};

pub const KERNEL_NAME: &str = "vdf";

pub struct SdAccel {
    geometry: Geometry,
    device_name: String,
    xclbin: PathBuf,
    context: Context,
    queue: CommandQueue,
    kernel: Kernel,
    in_buffer: Option<Buffer<cl_uint>>,
    out_buffer: Option<Buffer<cl_uint>>,
    // Table images stay resident so the device allocations outlive us.
    table_buffers: Vec<Buffer<u8>>,
    host_in: AlignedWords,
    host_out: AlignedWords,
    initialized: bool,
    tables_loaded: bool,
    quiet: bool,
}

// SAFETY: OpenCL 1.2 objects are thread safe; the runtime serializes access
// to the handles these fields wrap.
unsafe impl Send for SdAccel {}

impl SdAccel {
    /// Program the first accelerator device found with `xclbin` and bind the
    /// squaring kernel.
    pub fn new(geometry: Geometry, xclbin: &Path) -> Result<Self> {
        let accel_ids = get_all_devices(CL_DEVICE_TYPE_ACCELERATOR).unwrap_or_default();
        let id = match accel_ids.first() {
            Some(&id) => id,
            None => {
                let all_ids = get_all_devices(CL_DEVICE_TYPE_ALL)
                    .map_err(|e| Error::OpenCl(e.to_string()))?;
                *all_ids
                    .first()
                    .ok_or_else(|| Error::OpenCl("no OpenCL devices found".to_string()))?
            }
        };
        let device = ClDevice::new(id);
        let device_name = device.name().unwrap_or_default().trim().to_string();

        let context = Context::from_device(&device).map_err(|e| Error::OpenCl(e.to_string()))?;
        // The Xilinx shell speaks OpenCL 1.2, so the 1.2 queue API it is.
        #[allow(deprecated)]
        let queue = CommandQueue::create_default(&context, 0)
            .map_err(|e| Error::OpenCl(e.to_string()))?;

        let binary = fs::read(xclbin).map_err(|e| {
            Error::Config(format!("cannot read xclbin {}: {e}", xclbin.display()))
        })?;
        let program = Program::create_and_build_from_binary(&context, &[&binary], "")
            .map_err(|e| Error::OpenCl(e.to_string()))?;
        let kernel =
            Kernel::create(&program, KERNEL_NAME).map_err(|e| Error::OpenCl(e.to_string()))?;

        Ok(Self {
            geometry,
            device_name,
            xclbin: xclbin.to_path_buf(),
            context,
            queue,
            kernel,
            in_buffer: None,
            out_buffer: None,
            table_buffers: Vec::new(),
            host_in: AlignedWords::zeroed(0),
            host_out: AlignedWords::zeroed(0),
            initialized: false,
            tables_loaded: false,
            quiet: false,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl Device for SdAccel {
    fn reset(&mut self) -> Result<()> {
        // The datapath re-arms on each job handshake; only host state to clear.
        self.host_in.fill(0);
        self.host_out.fill(0);
        Ok(())
    }

    fn init(&mut self, words_in: usize, words_out: usize) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        if words_in != self.geometry.words_in() {
            return Err(Error::WordCountMismatch {
                host: words_in,
                device: self.geometry.words_in(),
            });
        }
        if words_out != self.geometry.words_out() {
            return Err(Error::WordCountMismatch {
                host: words_out,
                device: self.geometry.words_out(),
            });
        }

        self.host_in = AlignedWords::zeroed(words_in);
        self.host_out = AlignedWords::zeroed(words_out);
        self.in_buffer = Some(unsafe {
            Buffer::<cl_uint>::create(&self.context, CL_MEM_READ_ONLY, words_in, ptr::null_mut())
                .map_err(|e| Error::OpenCl(e.to_string()))?
        });
        self.out_buffer = Some(unsafe {
            Buffer::<cl_uint>::create(&self.context, CL_MEM_WRITE_ONLY, words_out, ptr::null_mut())
                .map_err(|e| Error::OpenCl(e.to_string()))?
        });

        if !self.quiet {
            println!(
                "Programmed {} with {}",
                self.device_name,
                self.xclbin.display()
            );
        }
        self.initialized = true;
        Ok(())
    }

    fn load_reduction_tables(&mut self, dir: &Path) -> Result<()> {
        if self.geometry.num_urams > 0 {
            let banks = tables::load(dir, self.geometry.num_urams)?;
            for bank in &banks {
                let mut buf = unsafe {
                    Buffer::<u8>::create(&self.context, CL_MEM_READ_ONLY, bank.len(), ptr::null_mut())
                        .map_err(|e| Error::OpenCl(e.to_string()))?
                };
                let event = unsafe {
                    self.queue
                        .enqueue_write_buffer(&mut buf, CL_BLOCKING, 0, bank, &[])
                        .map_err(|e| Error::OpenCl(e.to_string()))?
                };
                event.wait().map_err(|e| Error::OpenCl(e.to_string()))?;
                self.table_buffers.push(buf);
            }
            if !self.quiet {
                println!("Loaded {} reduction table banks", banks.len());
            }
        }
        self.tables_loaded = true;
        Ok(())
    }

    fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }

    fn compute_job(&mut self, job: &Job) -> Result<JobOutput> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        if self.geometry.num_urams > 0 && !self.tables_loaded {
            return Err(Error::TablesNotLoaded);
        }
        let in_buffer = self.in_buffer.as_mut().ok_or(Error::NotInitialized)?;
        let out_buffer = self.out_buffer.as_ref().ok_or(Error::NotInitialized)?;

        self.host_in
            .copy_from_slice(&words::pack_job(job, &self.geometry)?);

        let write_event = unsafe {
            self.queue
                .enqueue_write_buffer(in_buffer, CL_BLOCKING, 0, &self.host_in, &[])
                .map_err(|e| Error::OpenCl(e.to_string()))?
        };
        write_event
            .wait()
            .map_err(|e| Error::OpenCl(e.to_string()))?;

        // Single compute unit, single work item.
        let kernel_event = unsafe {
            ExecuteKernel::new(&self.kernel)
                .set_arg(in_buffer as &Buffer<cl_uint>)
                .set_arg(out_buffer)
                .set_global_work_size(1)
                .enqueue_nd_range(&self.queue)
                .map_err(|e| Error::OpenCl(e.to_string()))?
        };
        kernel_event
            .wait()
            .map_err(|e| Error::OpenCl(e.to_string()))?;

        let read_event = unsafe {
            self.queue
                .enqueue_read_buffer(out_buffer, CL_BLOCKING, 0, &mut self.host_out, &[])
                .map_err(|e| Error::OpenCl(e.to_string()))?
        };
        read_event
            .wait()
            .map_err(|e| Error::OpenCl(e.to_string()))?;

        words::unpack_output(&self.host_out, &self.geometry)
    }
}
