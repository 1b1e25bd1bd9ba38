//! Host-visible buffers
//!
//! Frame slots keep their parameter block in a buffer that stays mapped for
//! its whole life. The memory is host-coherent, so a plain copy is visible to
//! the GPU without flushing.

use ash::{vk, Device};
use std::ptr::NonNull;

use super::{VulkanError, VulkanResult};

/// Buffer bound to persistently mapped, host-coherent memory
pub struct MappedBuffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    mapped: NonNull<u8>,
    size: usize,
}

impl MappedBuffer {
    /// Create, allocate, bind and map a buffer of `size` bytes
    ///
    /// Anything created before a failing step is released before returning.
    pub fn new(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        size: usize,
        usage: vk::BufferUsageFlags,
    ) -> VulkanResult<Self> {
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size as vk::DeviceSize)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.create_buffer(&buffer_info, None).map_err(VulkanError::Api)? };

        match Self::allocate_and_map(&device, memory_properties, buffer) {
            Ok((memory, mapped)) => Ok(Self {
                device,
                buffer,
                memory,
                mapped,
                size,
            }),
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                Err(e)
            }
        }
    }

    fn allocate_and_map(
        device: &Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        buffer: vk::Buffer,
    ) -> VulkanResult<(vk::DeviceMemory, NonNull<u8>)> {
        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let memory_type_index = find_memory_type(
            memory_properties,
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);
        let memory = unsafe { device.allocate_memory(&alloc_info, None).map_err(VulkanError::Api)? };

        let mapped = unsafe {
            device
                .bind_buffer_memory(buffer, memory, 0)
                .and_then(|()| device.map_memory(memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty()))
        };
        let mapped = match mapped {
            Ok(ptr) => NonNull::new(ptr.cast::<u8>()).ok_or_else(|| VulkanError::InvalidOperation {
                reason: "vkMapMemory returned a null pointer".to_string(),
            }),
            Err(e) => Err(VulkanError::Api(e)),
        };

        match mapped {
            Ok(ptr) => Ok((memory, ptr)),
            Err(e) => {
                unsafe { device.free_memory(memory, None) };
                Err(e)
            }
        }
    }

    /// Copy `bytes` to the start of the buffer
    pub fn write(&mut self, bytes: &[u8]) -> VulkanResult<()> {
        if bytes.len() > self.size {
            return Err(VulkanError::InvalidOperation {
                reason: format!("write of {} bytes into {}-byte buffer", bytes.len(), self.size),
            });
        }
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.mapped.as_ptr(), bytes.len());
        }
        Ok(())
    }

    /// Current contents of the mapping
    pub fn bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.mapped.as_ptr(), self.size) }
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for MappedBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.unmap_memory(self.memory);
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Find the first memory type allowed by `type_filter` that has all of `properties`
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_filter: u32,
    properties: vk::MemoryPropertyFlags,
) -> VulkanResult<u32> {
    (0..memory_properties.memory_type_count)
        .find(|&i| {
            (type_filter & (1 << i)) != 0
                && memory_properties.memory_types[i as usize]
                    .property_flags
                    .contains(properties)
        })
        .ok_or(VulkanError::NoSuitableMemoryType)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_properties(flags: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut props = vk::PhysicalDeviceMemoryProperties::default();
        props.memory_type_count = flags.len() as u32;
        for (i, &property_flags) in flags.iter().enumerate() {
            props.memory_types[i] = vk::MemoryType {
                property_flags,
                heap_index: 0,
            };
        }
        props
    }

    const HOST: vk::MemoryPropertyFlags = vk::MemoryPropertyFlags::from_raw(
        vk::MemoryPropertyFlags::HOST_VISIBLE.as_raw() | vk::MemoryPropertyFlags::HOST_COHERENT.as_raw(),
    );

    #[test]
    fn test_finds_host_coherent_type() {
        let props = memory_properties(&[vk::MemoryPropertyFlags::DEVICE_LOCAL, HOST]);
        assert_eq!(find_memory_type(&props, 0b11, HOST).unwrap(), 1);
    }

    #[test]
    fn test_respects_type_filter() {
        let props = memory_properties(&[HOST, HOST]);
        assert_eq!(find_memory_type(&props, 0b10, HOST).unwrap(), 1);
    }

    #[test]
    fn test_partial_match_is_rejected() {
        let props = memory_properties(&[vk::MemoryPropertyFlags::HOST_VISIBLE]);
        assert!(matches!(
            find_memory_type(&props, 0b1, HOST),
            Err(VulkanError::NoSuitableMemoryType)
        ));
    }
}
